// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
#![no_main]

use libfuzzer_sys::fuzz_target;
use psychonaut_journal::interaction::InteractionGraph;
use psychonaut_journal::substance::SubstanceRepo;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(repo) = SubstanceRepo::from_json(text) else {
        return;
    };
    // Pattern errors are fine, panics are not
    if let Ok(graph) = InteractionGraph::build(&repo) {
        let names: Vec<String> = repo.substances().iter().map(|s| s.name.clone()).collect();
        let _ = graph.check(&names);
    }
    for substance in repo.substances() {
        for roa in &substance.roas {
            if let Some(dose) = &roa.dose {
                let _ = dose.classify(1.0, &dose.units);
            }
        }
    }
});
