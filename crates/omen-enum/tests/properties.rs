//! Property tests for the enumeration invariants: exact level accounting,
//! non-decreasing totals, no duplicates, determinism, and recoverability
//! of the training strings.

mod common;

use std::collections::HashSet;

use common::train_model;
use omen_enum::MarkovEnumerator;
use proptest::prelude::*;

fn corpus_strategy() -> impl Strategy<Value = Vec<String>> {
    proptest::collection::vec("[abc]{1,5}", 1..12)
}

fn drain(model: &omen_model::Model) -> Vec<(String, u32)> {
    let mut enumerator = MarkovEnumerator::new(model).expect("model is valid");
    std::iter::from_fn(move || enumerator.next_guess()).collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn emitted_totals_account_exactly(corpus in corpus_strategy(), ngram in 2usize..=3) {
        let refs: Vec<&str> = corpus.iter().map(String::as_str).collect();
        let model = train_model(&refs, "abc", ngram, 5, 3);
        let checker = MarkovEnumerator::new(&model).unwrap();
        for (guess, level) in drain(&model) {
            prop_assert_eq!(checker.parse(&guess).total, Some(level));
        }
    }

    #[test]
    fn totals_never_decrease_and_nothing_repeats(corpus in corpus_strategy(), ngram in 2usize..=3) {
        let refs: Vec<&str> = corpus.iter().map(String::as_str).collect();
        let model = train_model(&refs, "abc", ngram, 5, 3);
        let mut seen = HashSet::new();
        let mut last = 0u32;
        for (guess, level) in drain(&model) {
            prop_assert!(level >= last);
            last = level;
            prop_assert!(seen.insert(guess.clone()), "duplicate {}", guess);
        }
        // Every string over the alphabet within the length bounds is
        // enumerable thanks to smoothing.
        let min_len = ngram - 1;
        let expected: usize = (min_len..=5).map(|len| 3usize.pow(len as u32)).sum();
        prop_assert_eq!(seen.len(), expected);
    }

    #[test]
    fn admissible_training_strings_are_recovered(corpus in corpus_strategy(), ngram in 2usize..=3) {
        let refs: Vec<&str> = corpus.iter().map(String::as_str).collect();
        let model = train_model(&refs, "abc", ngram, 5, 3);
        let emitted: HashSet<String> = drain(&model).into_iter().map(|(g, _)| g).collect();
        for password in &corpus {
            if password.chars().count() >= ngram - 1 {
                prop_assert!(emitted.contains(password), "missing {}", password);
            }
        }
    }

    #[test]
    fn independent_runs_are_byte_identical(corpus in corpus_strategy()) {
        let refs: Vec<&str> = corpus.iter().map(String::as_str).collect();
        let model = train_model(&refs, "abc", 2, 5, 3);
        prop_assert_eq!(drain(&model), drain(&model));
    }

    #[test]
    fn resume_at_any_cut_is_seamless(corpus in corpus_strategy(), cut in 0usize..40) {
        let refs: Vec<&str> = corpus.iter().map(String::as_str).collect();
        let model = train_model(&refs, "abc", 2, 5, 3);
        let full = drain(&model);
        let cut = cut.min(full.len());

        let mut head = MarkovEnumerator::new(&model).unwrap();
        for _ in 0..cut {
            head.next_guess();
        }
        let state = head.state();
        drop(head);

        let mut resumed = MarkovEnumerator::restore(&model, state).unwrap();
        let tail: Vec<(String, u32)> = std::iter::from_fn(|| resumed.next_guess()).collect();
        prop_assert_eq!(&full[cut..], tail.as_slice());
    }
}
