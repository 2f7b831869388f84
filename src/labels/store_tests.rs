// In: src/labels/store_tests.rs

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    use crate::config::MaskStrategy;
    use crate::error::LabelFrameError;
    use crate::kernels::mask;
    use crate::labels::{LabelCatalog, LabelStore, ReplaceMethod};

    fn people() -> LabelStore {
        LabelStore::from_columns(&[
            ("name", vec!["ann", "bea", "cal"]),
            ("gender", vec!["male", "female", "female"]),
            ("state", vec!["Ohio", "iowa", "NEW_OHIO"]),
        ])
        .unwrap()
    }

    //==============================================================================
    // Construction
    //==============================================================================

    #[test]
    fn test_from_columns_keeps_field_order() {
        let store = people();
        assert_eq!(store.n_rows(), 3);
        assert_eq!(store.field_names(), vec!["name", "gender", "state"]);
        assert_eq!(store.label_row(1), Some(vec!["bea", "female", "iowa"]));
        assert_eq!(store.label_row(3), None);
        store.check_consistency().unwrap();
    }

    #[test]
    fn test_add_field_errors() {
        let store = people();
        assert!(matches!(
            store.add_field("name", &["a", "b", "c"]),
            Err(LabelFrameError::FieldExists(_))
        ));
        assert!(matches!(
            store.add_field("age", &["old", "young"]),
            Err(LabelFrameError::DimensionMismatch(_))
        ));
        assert!(matches!(
            store.add_field("", &["a", "b", "c"]),
            Err(LabelFrameError::InvalidLabelKind { .. })
        ));
        // "female" already belongs to `gender`.
        assert!(matches!(
            store.add_field("role", &["female", "x", "y"]),
            Err(LabelFrameError::AmbiguousTarget { ref field, .. }) if field == "gender"
        ));
    }

    #[test]
    fn test_remove_and_rename_field() {
        let store = people();
        let removed = store.remove_field("state").unwrap();
        assert_eq!(removed.field_names(), vec!["name", "gender"]);
        assert!(matches!(
            store.remove_field("nope"),
            Err(LabelFrameError::FieldNotFound(_))
        ));

        let renamed = store.rename_field("gender", "sex").unwrap();
        assert_eq!(renamed.field_names(), vec!["name", "sex", "state"]);
        assert!(matches!(
            store.rename_field("gender", "name"),
            Err(LabelFrameError::FieldExists(_))
        ));
    }

    //==============================================================================
    // Queries
    //==============================================================================

    #[test]
    fn test_exact_term_and_only_agree() {
        let store = people();
        let by_term = store.query(&["female"], None).unwrap();
        assert_eq!(by_term, mask::from_bools(&[false, true, true]));

        let by_field = store.only(&[("gender", vec!["female"])]).unwrap();
        assert_eq!(by_term, by_field);
    }

    #[test]
    fn test_terms_are_anded() {
        let store = people();
        let rows = store.query(&["female", "cal"], None).unwrap();
        assert_eq!(mask::indices(&rows), vec![2]);

        let nothing = store.query(&["female", "nobody"], None).unwrap();
        assert_eq!(nothing.count_ones(), 0);
        assert_eq!(nothing.len(), 3);

        let everything = store.query::<&str>(&[], None).unwrap();
        assert_eq!(everything.count_ones(), 3);
    }

    #[test]
    fn test_wildcard_term() {
        let store = people();
        let rows = store.query(&["*ohio"], None).unwrap();
        assert_eq!(mask::indices(&rows), vec![0, 2]);
    }

    #[test]
    fn test_shared_label_is_ambiguous_but_only_works() {
        let store = LabelStore::from_columns(&[("a", vec!["x", "y"])])
            .unwrap()
            .add_field_shared("b", &["z", "x"])
            .unwrap();

        let result = store.query(&["x"], None);
        assert!(matches!(
            result,
            Err(LabelFrameError::AmbiguousTerm { ref fields, .. }) if fields.len() == 2
        ));

        let restricted = store.query(&["x"], Some(&["b"][..])).unwrap();
        assert_eq!(mask::indices(&restricted), vec![1]);

        let rows = store.only(&[("a", vec!["x"])]).unwrap();
        assert_eq!(mask::indices(&rows), vec![0]);
    }

    #[test]
    fn test_wildcard_across_fields_is_ambiguous() {
        let store = LabelStore::from_columns(&[
            ("state", vec!["Ohio", "Iowa"]),
            ("city", vec!["ohio_city", "ames"]),
        ])
        .unwrap();

        let result = store.query(&["*ohio"], None);
        assert!(matches!(
            result,
            Err(LabelFrameError::AmbiguousTerm { ref fields, .. })
                if fields == &["state", "city"]
        ));

        let in_city = store.query(&["*OHIO"], Some(&["city"][..])).unwrap();
        assert_eq!(mask::indices(&in_city), vec![0]);
        let in_state = store.query(&["*io"], Some(&["state"][..])).unwrap();
        assert_eq!(mask::indices(&in_state), vec![0, 1]);
    }

    #[test]
    fn test_repeated_restrict_field_counts_once() {
        let store = LabelStore::from_columns(&[("a", vec!["x", "y"])]).unwrap();
        let rows = store.query(&["x"], Some(&["a", "a"][..])).unwrap();
        assert_eq!(mask::indices(&rows), vec![0]);

        let replaced = store
            .replace("x", "w", ReplaceMethod::Complete, Some(&["a", "a"][..]))
            .unwrap();
        assert_eq!(replaced.field("a").unwrap().unique_labels(), &["w", "y"]);
    }

    #[test]
    fn test_only_or_within_and_across() {
        let store = people();
        let rows = store
            .only(&[("name", vec!["ann", "cal", "missing"]), ("gender", vec!["female"])])
            .unwrap();
        assert_eq!(mask::indices(&rows), vec![2]);
        assert!(matches!(
            store.only(&[("age", vec!["old"])]),
            Err(LabelFrameError::FieldNotFound(_))
        ));
    }

    //==============================================================================
    // Rewrites
    //==============================================================================

    #[test]
    fn test_replace_routes_to_owning_field() {
        let store = people();
        let replaced = store
            .replace("female", "f", ReplaceMethod::Complete, None)
            .unwrap();
        assert_eq!(replaced.field("gender").unwrap().unique_labels(), &["male", "f"]);
        assert!(matches!(
            store.replace("nobody", "x", ReplaceMethod::Complete, None),
            Err(LabelFrameError::LabelNotFound(_))
        ));
        // Renaming a state to a person's name would cross fields.
        assert!(matches!(
            store.replace("iowa", "ann", ReplaceMethod::Complete, None),
            Err(LabelFrameError::AmbiguousTarget { .. })
        ));
    }

    #[test]
    fn test_replace_beside_a_shared_label() {
        let store = LabelStore::from_columns(&[("a", vec!["x", "y"])])
            .unwrap()
            .add_field_shared("b", &["z", "x"])
            .unwrap();

        // "x" is already shared; rewriting "y" must only check the new label.
        let replaced = store
            .replace("y", "fresh", ReplaceMethod::Complete, None)
            .unwrap();
        assert_eq!(replaced.field("a").unwrap().unique_labels(), &["x", "fresh"]);
        replaced.check_consistency().unwrap();

        assert!(matches!(
            store.replace("y", "z", ReplaceMethod::Complete, None),
            Err(LabelFrameError::AmbiguousTarget { ref label, ref field }) if label == "z" && field == "b"
        ));
    }

    #[test]
    fn test_collapse_field() {
        let collapsed = people().collapse("gender").unwrap();
        let gender = collapsed.field("gender").unwrap();
        assert_eq!(gender.unique_labels(), &["all__gender"]);
        assert_eq!(gender.mask_for("all__gender").unwrap().count_ones(), 3);
    }

    //==============================================================================
    // Row Operations
    //==============================================================================

    #[test]
    fn test_select_is_idempotent() {
        let store = people();
        let rows = store.query(&["female"], None).unwrap();
        let once = store.select(&rows).unwrap();
        let again = once.select(&once.query(&["female"], None).unwrap()).unwrap();
        assert_eq!(once, again);
        assert_eq!(once.n_rows(), 2);
        assert!(!once.field("gender").unwrap().contains("male"));
        once.check_consistency().unwrap();
    }

    #[test]
    fn test_append_requires_same_fields() {
        let a = LabelStore::from_columns(&[("outcome", vec!["hit"]), ("trial", vec!["t1"])]).unwrap();
        let b = LabelStore::from_columns(&[("trial", vec!["t2"]), ("outcome", vec!["miss"])]).unwrap();
        let joined = a.append(&b).unwrap();
        assert_eq!(joined.n_rows(), 2);
        assert_eq!(joined.field_names(), vec!["outcome", "trial"]);
        joined.check_consistency().unwrap();

        let c = LabelStore::from_columns(&[("outcome", vec!["hit"])]).unwrap();
        assert!(matches!(
            a.append(&c),
            Err(LabelFrameError::FieldSetMismatch(_))
        ));

        // "t1" as an outcome would now live in two fields.
        let d = LabelStore::from_columns(&[("outcome", vec!["t1"]), ("trial", vec!["t9"])]).unwrap();
        assert!(matches!(
            a.append(&d),
            Err(LabelFrameError::AmbiguousTarget { .. })
        ));
    }

    #[test]
    fn test_rows_match_and_equivalent() {
        let a = people();
        let b = LabelStore::from_columns(&[
            ("state", vec!["Ohio", "iowa", "NEW_OHIO"]),
            ("gender", vec!["male", "female", "female"]),
            ("name", vec!["ann", "bea", "cal"]),
        ])
        .unwrap();
        assert!(a.rows_match(&b));
        assert!(a.equivalent(&b).is_ok());

        let shuffled = LabelStore::from_columns(&[
            ("name", vec!["bea", "ann", "cal"]),
            ("gender", vec!["male", "female", "female"]),
            ("state", vec!["Ohio", "iowa", "NEW_OHIO"]),
        ])
        .unwrap();
        assert!(!a.rows_match(&shuffled));
        assert!(a.equivalent(&shuffled).is_ok());
        assert!(a.equivalent(&a.remove_field("state").unwrap()).is_err());
    }

    #[test]
    fn test_combinations_group_rows() {
        let store = LabelStore::from_columns(&[
            ("outcome", vec!["hit", "miss", "hit", "hit"]),
            ("trial", vec!["t1", "t1", "t2", "t1"]),
        ])
        .unwrap();
        let groups = store.combinations(&["outcome", "trial"]).unwrap();
        assert_eq!(groups.len(), 3);
        assert_eq!(groups[0].labels, vec!["hit", "t1"]);
        assert_eq!(mask::indices(&groups[0].mask), vec![0, 3]);
        assert_eq!(groups[2].labels, vec!["hit", "t2"]);

        let whole = store.combinations(&[]).unwrap();
        assert_eq!(whole.len(), 1);
        assert_eq!(whole[0].mask.count_ones(), 4);
    }

    //==============================================================================
    // Randomized Partition Checks
    //==============================================================================

    #[test]
    fn test_random_fields_partition_and_round_trip() {
        let mut rng = StdRng::seed_from_u64(7);
        let alphabet = ["a", "b", "c", "d", "e"];

        for n_rows in [1usize, 17, 250] {
            let raw: Vec<&str> = (0..n_rows)
                .map(|_| alphabet[rng.random_range(0..alphabet.len())])
                .collect();

            let catalog = LabelCatalog::build("f", &raw).unwrap();
            catalog.validate_partition().unwrap();
            assert_eq!(catalog.decompress().to_vec(), raw);

            for strategy in [MaskStrategy::Batched, MaskStrategy::PerLabel] {
                let rebuilt = catalog.decompress().compress(strategy).unwrap();
                assert_eq!(rebuilt, catalog);
            }

            let rows: Vec<bool> = (0..n_rows).map(|_| rng.random_bool(0.5)).collect();
            let selected = catalog.select(&mask::from_bools(&rows)).unwrap();
            selected.validate_partition().unwrap();
            let expected: Vec<&str> = raw
                .iter()
                .zip(&rows)
                .filter(|(_, keep)| **keep)
                .map(|(label, _)| *label)
                .collect();
            assert_eq!(selected.decompress().to_vec(), expected);
        }
    }
}
