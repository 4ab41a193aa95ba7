// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
#![no_main]

use libfuzzer_sys::fuzz_target;
use psychonaut_journal::journal::Journal;
use psychonaut_journal::substance::SubstanceRepo;
use psychonaut_journal::timeline::ExperienceTimeline;
use psychonaut_journal::types::JournalStore;

fuzz_target!(|data: &[u8]| {
    let Ok(store) = serde_json::from_slice::<JournalStore>(data) else {
        return;
    };
    let Ok(repo) = SubstanceRepo::bundled() else {
        return;
    };

    let mut journal = Journal::new();
    journal.merge(store.clone());
    // Merging twice adds nothing
    let again = journal.merge(store);
    assert_eq!(again.experiences, 0);
    assert_eq!(again.ingestions, 0);

    let now = chrono::Utc::now();
    for experience in journal.experiences() {
        let ingestions = journal.ingestions_of(&experience.id);
        let _ = ExperienceTimeline::build(&ingestions, &repo, 0.5, now);
        let _ = psychonaut_journal::dose::cumulative_doses(&ingestions, &repo);
    }
});
