//! Replace the stored flashcard deck with a starter set or a JSON file.

#[cfg(feature = "mongo-store")]
mod seed {
    use std::{env, fs, path::Path};

    use anyhow::Context;
    use serde::Deserialize;

    use flashduel_back::dao::{
        match_store::mongodb::{MongoConfig, MongoDuelStore},
        models::FlashcardEntity,
    };

    #[derive(Deserialize)]
    struct SeedCard {
        question: String,
        answer: String,
    }

    /// Deck used when no file is given on the command line.
    fn starter_deck() -> Vec<FlashcardEntity> {
        [
            ("What is the capital of France?", "Paris"),
            ("What is 5 + 7?", "12"),
            ("Who wrote 'Hamlet'?", "Shakespeare"),
            ("What is the largest planet in our Solar System?", "Jupiter"),
            ("Which language runs in a web browser?", "JavaScript"),
        ]
        .into_iter()
        .map(|(question, answer)| FlashcardEntity {
            question: question.to_string(),
            answer: answer.to_string(),
        })
        .collect()
    }

    /// Read a deck from a JSON array of `{ "question", "answer" }` objects.
    fn deck_from_file(path: &Path) -> anyhow::Result<Vec<FlashcardEntity>> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("reading deck file `{}`", path.display()))?;
        let cards: Vec<SeedCard> = serde_json::from_str(&contents)
            .with_context(|| format!("parsing deck file `{}`", path.display()))?;
        Ok(cards
            .into_iter()
            .map(|card| FlashcardEntity {
                question: card.question,
                answer: card.answer,
            })
            .collect())
    }

    pub async fn run() -> anyhow::Result<()> {
        let deck = match env::args().nth(1) {
            Some(path) => deck_from_file(Path::new(&path))?,
            None => starter_deck(),
        };

        let config = MongoConfig::from_env()
            .await
            .context("reading MongoDB settings from the environment")?;
        let store = MongoDuelStore::connect(config)
            .await
            .context("connecting to MongoDB")?;
        let count = store
            .replace_flashcard_deck(deck)
            .await
            .context("replacing the flashcard deck")?;

        println!("seeded {count} flashcards");
        Ok(())
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    #[cfg(feature = "mongo-store")]
    seed::run().await?;
    Ok(())
}
