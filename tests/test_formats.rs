#[cfg(test)]
mod tests {
    use life_engines::format::{self, CellStateFormat, FixedFormat};
    use life_engines::*;
    use proptest::prelude::*;

    const SEED: u64 = 42;

    fn cells(coords: &[(i64, i64)]) -> CellState {
        coords.iter().map(|&c| CellCoordinate::from(c)).collect()
    }

    fn roundtrip(state: &CellState, metadata: &CellStateMetadata, target: FixedFormat) -> ParsedCellState {
        let text = format::serialize(state, metadata, target);
        format::parse(target.into(), &text)
            .unwrap_or_else(|e| panic!("{} failed to parse its own output: {}\n{}", target.name(), e, text))
    }

    #[test]
    fn test_plaintext_to_rle() {
        let parsed = format::parse(CellStateFormat::Fixed(FixedFormat::Plaintext), "O").unwrap();
        assert_eq!(parsed.cell_state, cells(&[(0, 0)]));
        assert_eq!(
            format::serialize(&parsed.cell_state, &parsed.metadata, FixedFormat::RunLengthEncoding),
            "x = 1, y = 1, rule = B3/S23\no!"
        );
    }

    #[test]
    fn test_rle_body() {
        let parsed = format::parse(
            CellStateFormat::Unknown,
            "x = 3, y = 3, rule = B3/S23\n2o$bo$3o!",
        )
        .unwrap();
        assert_eq!(parsed.format, FixedFormat::RunLengthEncoding);
        assert_eq!(
            parsed.cell_state,
            cells(&[(0, 0), (1, 0), (1, 1), (0, 2), (1, 2), (2, 2)])
        );
        assert_eq!(parsed.metadata.rule, Some(Rule::CONWAY));
        assert_eq!(parsed.metadata.declared_size, Some((3, 3)));
    }

    #[test]
    fn test_rle_missing_terminator() {
        let result = format::parse(
            CellStateFormat::Fixed(FixedFormat::RunLengthEncoding),
            "x = 3, y = 3, rule = B3/S23\n2o$bo$3o",
        );
        assert!(matches!(result, Err(ParseError::MalformedContent(_))));
    }

    #[test]
    fn test_random_soup_in_every_format() {
        let state = CellState::random(50, 30, 0.4, Some(SEED))
            .translated(-1_000_000, 333)
            .unwrap();
        for target in FixedFormat::ALL {
            let parsed = roundtrip(&state, &CellStateMetadata::default(), target);
            assert_eq!(parsed.cell_state, state, "{} lost cells", target.name());
            assert_eq!(parsed.format, target);
        }
    }

    #[test]
    fn test_empty_state_in_every_format() {
        for target in FixedFormat::ALL {
            let parsed = roundtrip(&CellState::empty(), &CellStateMetadata::default(), target);
            assert!(parsed.cell_state.is_empty(), "{} produced cells", target.name());
        }
    }

    #[test]
    fn test_conversion_chain() {
        let state = CellState::random(20, 20, 0.5, Some(SEED));
        let mut current = state.clone();
        for target in FixedFormat::ALL.into_iter().chain(FixedFormat::ALL.into_iter().rev()) {
            current = roundtrip(&current, &CellStateMetadata::default(), target).cell_state;
        }
        assert_eq!(current, state);
    }

    #[test]
    fn test_gzip_macrocell() {
        let state = CellState::random(64, 64, 0.3, Some(SEED));
        let metadata = CellStateMetadata {
            name: Some("Soup".to_string()),
            ..Default::default()
        };
        let text = format::serialize(&state, &metadata, FixedFormat::Macrocell);
        let compressed = format::compress(&text).unwrap();
        let parsed = format::parse_bytes(CellStateFormat::Unknown, &compressed).unwrap();
        assert_eq!(parsed.format, FixedFormat::Macrocell);
        assert_eq!(parsed.cell_state, state);
        assert_eq!(parsed.metadata.name.as_deref(), Some("Soup"));
    }

    #[test]
    fn test_unrecognized_content() {
        for text in ["", "\n\n", "hello world", "x y z"] {
            assert_eq!(
                format::parse(CellStateFormat::Unknown, text).unwrap_err(),
                ParseError::UnrecognizedFormat
            );
        }
    }

    #[test]
    fn test_non_ascii_tags() {
        let cases = [
            (CellStateFormat::Fixed(FixedFormat::RunLengthEncoding), "#é\nx = 1, y = 1\no!"),
            (CellStateFormat::Life, "#Life 1.05\n#ñame\n#P 0 0\n*\n"),
            (CellStateFormat::Unknown, "[M2]\n#ü\n"),
            (CellStateFormat::Unknown, "#Life 1.06\n#ß\n0 0\n"),
        ];
        for (detected, text) in cases {
            let parsed = format::parse(detected, text).unwrap();
            assert!(parsed.cell_state.population() <= 1);
        }
    }

    #[test]
    fn test_corners_of_the_plane() {
        let state = cells(&[
            (i64::MIN, i64::MIN),
            (i64::MIN + 1, i64::MIN),
            (i64::MAX, i64::MAX),
            (i64::MAX - 1, i64::MAX),
        ]);
        // formats whose size does not grow with the distance between cells
        for target in [FixedFormat::Life106, FixedFormat::RunLengthEncoding, FixedFormat::Macrocell] {
            assert_eq!(roundtrip(&state, &CellStateMetadata::default(), target).cell_state, state);
        }
        for corner in [(i64::MIN, i64::MIN), (i64::MAX - 1, i64::MAX - 1)] {
            let block = cells(&[(0, 0), (1, 0), (0, 1), (1, 1)])
                .translated(corner.0, corner.1)
                .unwrap();
            for target in FixedFormat::ALL {
                assert_eq!(roundtrip(&block, &CellStateMetadata::default(), target).cell_state, block);
            }
        }
    }

    #[test]
    fn test_from_file_extension_is_total() {
        let extensions = ["cells", "lif", "life", "rle", "mc", "gz", "", "MC", "rle.gz", "txt"];
        for extension in extensions.into_iter().map(Some).chain([None]) {
            let detected = CellStateFormat::from_file_extension(extension);
            if let CellStateFormat::Fixed(format) = detected {
                assert_eq!(
                    CellStateFormat::from_file_extension(Some(format.file_extension())),
                    detected
                );
            }
        }
    }

    fn offset_strategy() -> impl Strategy<Value = i64> {
        prop_oneof![
            -(1i64 << 40)..(1i64 << 40),
            i64::MIN..i64::MIN + 8,
            i64::MAX - 47..=i64::MAX - 39,
        ]
    }

    fn cell_state_strategy() -> impl Strategy<Value = CellState> {
        (
            prop::collection::vec((0i64..40, 0i64..40), 0..80),
            offset_strategy(),
            offset_strategy(),
        )
            .prop_map(|(coords, dx, dy)| {
                coords
                    .into_iter()
                    .map(|(x, y)| CellCoordinate::new(x + dx, y + dy))
                    .collect()
            })
    }

    fn metadata_strategy() -> impl Strategy<Value = CellStateMetadata> {
        (
            prop::option::of("[A-Za-zéü][A-Za-z0-9éüñ]{0,12}"),
            prop::collection::vec("[a-zßé][a-zßé ]{0,12}[a-zßé]", 0..3),
            0u16..512,
            0u16..512,
        )
            .prop_map(|(name, description, birth, survival)| {
                let counts = |mask: u16| (0..=8u8).filter(|&n| mask >> n & 1 != 0).collect::<Vec<_>>();
                CellStateMetadata {
                    name,
                    description,
                    rule: Rule::new(&counts(birth), &counts(survival)).ok(),
                    declared_size: None,
                }
            })
    }

    proptest! {
        #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]

        #[test]
        fn prop_cells_survive_every_format(state in cell_state_strategy()) {
            for target in FixedFormat::ALL {
                let parsed = roundtrip(&state, &CellStateMetadata::default(), target);
                prop_assert_eq!(&parsed.cell_state, &state);
            }
        }

        #[test]
        fn prop_sniffing_recovers_format(state in cell_state_strategy()) {
            prop_assume!(!state.is_empty());
            for target in FixedFormat::ALL {
                let text = format::serialize(&state, &CellStateMetadata::default(), target);
                let parsed = format::parse(CellStateFormat::Unknown, &text).unwrap();
                prop_assert_eq!(parsed.format, target);
                prop_assert_eq!(&parsed.cell_state, &state);
            }
        }

        #[test]
        fn prop_comments_never_panic(
            tag in "\\PC",
            value in "\\PC{0,8}",
            prefix in prop::sample::select(vec!["", "#Life 1.05\n", "#Life 1.06\n", "[M2]\n", "x = 1, y = 1\n"]),
        ) {
            let text = format!("{}#{}{}\n", prefix, tag, value);
            for detected in [CellStateFormat::Unknown, CellStateFormat::Life] {
                let _ = format::parse(detected, &text);
            }
            for target in FixedFormat::ALL {
                let _ = format::parse(target.into(), &text);
            }
        }

        #[test]
        fn prop_metadata_survives(state in cell_state_strategy(), metadata in metadata_strategy()) {
            for target in [FixedFormat::Life105, FixedFormat::RunLengthEncoding, FixedFormat::Macrocell] {
                let parsed = roundtrip(&state, &metadata, target);
                prop_assert_eq!(&parsed.metadata.name, &metadata.name);
                prop_assert_eq!(&parsed.metadata.description, &metadata.description);
                prop_assert_eq!(parsed.metadata.rule, metadata.rule);
            }
            let parsed = roundtrip(&state, &metadata, FixedFormat::Plaintext);
            prop_assert_eq!(&parsed.metadata.name, &metadata.name);
            prop_assert_eq!(&parsed.metadata.description, &metadata.description);
        }
    }
}
