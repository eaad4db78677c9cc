use anyhow::Result;

use crate::commands::generate::usage_key;
use crate::config::Settings;
use crate::crud::DB;
use crate::palette::Palette;
use crate::utils::pluralize;

pub async fn run(db: &DB, settings: &Settings) -> Result<()> {
    let used_today = db.generations_today(usage_key(&settings.identity)).await?;

    println!("Current plan: {}", Palette::paint(Palette::INFO, settings.tier));
    println!(
        "Used today:   {}",
        pluralize("generation", used_today as usize)
    );
    match settings.usage.remaining(used_today, settings.tier) {
        Some(remaining) => {
            println!(
                "Remaining:    {}",
                Palette::paint(Palette::WARNING, remaining)
            );
            if remaining == 0 {
                println!(
                    "\n{} for unlimited flashcards: {}",
                    Palette::bold("Upgrade to Premium"),
                    Palette::paint(Palette::ACCENT, &settings.upgrade_url)
                );
            }
        }
        None => println!("Remaining:    {}", Palette::paint(Palette::SUCCESS, "unlimited")),
    }
    match settings.identity.user_id.as_deref() {
        Some(user_id) => println!("Signed in as: {user_id}"),
        None => println!("{}", Palette::dim("Signed out: saving sets is disabled.")),
    }
    Ok(())
}
