use anyhow::{Result, bail};

use crate::commands::view;
use crate::config::Identity;
use crate::crud::DB;
use crate::palette::Palette;
use crate::utils::pluralize;

fn signed_in_user(identity: &Identity) -> Result<&str> {
    match identity.user_id.as_deref() {
        Some(user_id) => Ok(user_id),
        None => bail!("Saved sets need a signed-in user. Set FLASHGEN_USER_ID first."),
    }
}

pub async fn list(db: &DB, identity: &Identity, limit: u32) -> Result<()> {
    let user_id = signed_in_user(identity)?;
    let sets = db.list_sets(user_id, limit).await?;

    if sets.is_empty() {
        println!("No saved flashcard sets yet. Use `flashgen generate --save <TOPIC>`.");
        return Ok(());
    }

    for set in sets {
        println!(
            "{}  {}  {}  {}",
            Palette::paint(Palette::ACCENT, format!("#{:<4}", set.id)),
            Palette::dim(set.created_at.format("%Y-%m-%d %H:%M")),
            set.topic,
            Palette::dim(format!("({})", pluralize("card", set.card_count as usize)))
        );
    }
    Ok(())
}

pub async fn show(db: &DB, identity: &Identity, id: i64, plain: bool) -> Result<()> {
    let user_id = signed_in_user(identity)?;
    let Some(set) = db.get_set(user_id, id).await? else {
        bail!("No saved set #{id} for this user.");
    };

    if plain {
        println!("{}\n", Palette::bold(&set.topic));
        view::print_plain(&set.cards);
        Ok(())
    } else {
        view::run(set.cards, &set.topic)
    }
}
