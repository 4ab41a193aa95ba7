// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell

use super::AppContext;
use anyhow::Result;

/// Search substances by name, common name or category
pub fn run(ctx: &AppContext, query: &str) -> Result<()> {
    let repo = ctx.repo()?;
    let journal = ctx.load_journal()?;
    let hits = repo.search(query, &journal.store.custom_substances);

    if ctx.json {
        return ctx.print_json(&hits);
    }
    if hits.is_empty() {
        println!("No substances match '{}'", query);
        return Ok(());
    }
    for hit in &hits {
        let tag = if hit.is_custom {
            ctx.dim(" (custom)")
        } else if hit.categories.is_empty() {
            String::new()
        } else {
            ctx.dim(&format!("  {}", hit.categories.join(", ")))
        };
        println!("  {}{}", ctx.substance(&hit.name, journal.color_of(&hit.name)), tag);
    }
    Ok(())
}
