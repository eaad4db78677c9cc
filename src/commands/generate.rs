use anyhow::Result;
use tracing::debug;

use crate::commands::view;
use crate::config::{Identity, Settings};
use crate::crud::DB;
use crate::llm::completion::TextGenerator;
use crate::llm::{AuthStore, Topic, ensure_client};
use crate::palette::Palette;
use crate::pipeline::{Generation, Generator};
use crate::utils::pluralize;

/// Usage is tracked under this id when nobody is signed in.
pub const LOCAL_USER: &str = "local";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    Saved(i64),
    AlreadySaved(i64),
    SignedOut,
    SkippedFallback,
}

pub async fn run(db: &DB, settings: &Settings, topic: &str, save: bool, plain: bool) -> Result<()> {
    let Ok(topic) = Topic::parse(topic) else {
        debug!("blank topic, nothing to generate");
        return Ok(());
    };

    let usage_user = usage_key(&settings.identity);
    let used_today = db.generations_today(usage_user).await?;
    if !settings.usage.can_generate(used_today, settings.tier) {
        print_upgrade_notice(settings, used_today);
        return Ok(());
    }

    let store = AuthStore::open_default()?;
    let client = ensure_client(&settings.generation, &store)?;
    let generator = Generator::new(client, settings.generation.clone(), settings.fallback);

    println!(
        "Generating flashcards about {}...",
        Palette::paint(Palette::ACCENT, topic.as_str())
    );
    let Some(generation) = generate_and_record(db, &generator, usage_user, topic.as_str()).await?
    else {
        return Ok(());
    };

    if generation.is_fallback() {
        println!(
            "{}",
            Palette::paint(
                Palette::WARNING,
                "Failed to generate flashcards. Showing sample cards instead."
            )
        );
    }

    let outcome = if save {
        Some(save_generation(db, &settings.identity, &generation).await?)
    } else {
        None
    };

    if plain {
        view::print_plain(&generation.cards);
    } else {
        view::run(generation.cards.clone(), topic.as_str())?;
    }

    if let Some(outcome) = outcome {
        print_save_outcome(&outcome);
    }
    Ok(())
}

/// Runs the pipeline and logs the attempt against the daily allowance.
/// `None` when the topic was blank.
pub async fn generate_and_record<G: TextGenerator>(
    db: &DB,
    generator: &Generator<G>,
    usage_user: &str,
    topic: &str,
) -> Result<Option<Generation>> {
    let Ok(generation) = generator.generate(topic).await else {
        return Ok(None);
    };
    db.record_generation(usage_user, generation.topic.as_str(), &generation.source)
        .await?;
    Ok(Some(generation))
}

pub async fn save_generation(
    db: &DB,
    identity: &Identity,
    generation: &Generation,
) -> Result<SaveOutcome> {
    let Some(user_id) = identity.user_id.as_deref() else {
        return Ok(SaveOutcome::SignedOut);
    };
    if generation.is_fallback() {
        return Ok(SaveOutcome::SkippedFallback);
    }

    let topic = generation.topic.as_str();
    if let Some(id) = db.find_duplicate(user_id, topic, &generation.cards).await? {
        return Ok(SaveOutcome::AlreadySaved(id));
    }
    let id = db.save_set(user_id, topic, &generation.cards).await?;
    Ok(SaveOutcome::Saved(id))
}

pub fn usage_key(identity: &Identity) -> &str {
    identity.user_id.as_deref().unwrap_or(LOCAL_USER)
}

fn print_save_outcome(outcome: &SaveOutcome) {
    match outcome {
        SaveOutcome::Saved(id) => println!(
            "{} Open it again with `flashgen show {id}`.",
            Palette::paint(Palette::SUCCESS, format!("Saved as set #{id}."))
        ),
        SaveOutcome::AlreadySaved(id) => {
            println!("These flashcards are already saved as set #{id}.")
        }
        SaveOutcome::SignedOut => println!(
            "{}",
            Palette::dim("Not saved: set FLASHGEN_USER_ID to sign in and keep your sets.")
        ),
        SaveOutcome::SkippedFallback => {
            println!("{}", Palette::dim("Not saved: sample cards are not kept."))
        }
    }
}

fn print_upgrade_notice(settings: &Settings, used_today: u32) {
    println!(
        "\nYou've used {} today, the limit of the {} plan.",
        pluralize("generation", used_today as usize),
        Palette::paint(Palette::INFO, settings.tier)
    );
    println!(
        "{} for unlimited flashcards: {}",
        Palette::bold("Upgrade to Premium"),
        Palette::paint(Palette::ACCENT, &settings.upgrade_url)
    );
}
