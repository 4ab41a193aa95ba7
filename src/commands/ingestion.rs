// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell

use super::{format_dose, AppContext};
use anyhow::Result;

/// Run ingestion command
pub fn run(ctx: &AppContext, action: &str, id: &str) -> Result<()> {
    match action {
        "delete" | "rm" => {
            let mut journal = ctx.load_journal()?;
            let removed = journal.delete_ingestion(id)?;
            ctx.save_journal(&journal)?;
            println!(
                "Deleted ingestion: {} {} ({})",
                removed.substance,
                format_dose(removed.dose, &removed.units),
                removed.id
            );
            Ok(())
        }
        other => anyhow::bail!("Unknown action: {}. Valid: delete", other),
    }
}
