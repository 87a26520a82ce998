use pileup_rs::{Cigar, CigarOp, ParseCigarError};

fn ops(cigar: &Cigar) -> Vec<(u32, char)> {
    cigar.iter().map(|(len, op)| (*len, op.as_char())).collect()
}

#[test]
fn parses_every_operation() {
    let cigar: Cigar = "3H2S4M1I2D1N3=1X1P".parse().unwrap();
    assert_eq!(
        ops(&cigar),
        vec![
            (3, 'H'),
            (2, 'S'),
            (4, 'M'),
            (1, 'I'),
            (2, 'D'),
            (1, 'N'),
            (3, '='),
            (1, 'X'),
            (1, 'P'),
        ]
    );
    assert_eq!(cigar.to_string(), "3H2S4M1I2D1N3=1X1P");
}

#[test]
fn star_is_the_empty_cigar() {
    let cigar: Cigar = "*".parse().unwrap();
    assert!(cigar.is_empty());
    assert_eq!(cigar.to_string(), "*");
    assert_eq!(cigar.reference_len(), 0);
}

#[test]
fn consumption_classes() {
    let reference: Vec<char> = "MIDNSHP=X"
        .chars()
        .filter(|&c| CigarOp::from_char(c).unwrap().consumes_reference())
        .collect();
    let query: Vec<char> = "MIDNSHP=X"
        .chars()
        .filter(|&c| CigarOp::from_char(c).unwrap().consumes_query())
        .collect();
    assert_eq!(reference, vec!['M', 'D', 'N', '=', 'X']);
    assert_eq!(query, vec!['M', 'I', 'S', '=', 'X']);
    assert!(!CigarOp::HardClip.consumes_reference() && !CigarOp::HardClip.consumes_query());
    assert!(!CigarOp::Pad.consumes_reference() && !CigarOp::Pad.consumes_query());
}

#[test]
fn reference_and_query_lengths() {
    let cigar: Cigar = "2S3M1I2D4N1M5H".parse().unwrap();
    assert_eq!(cigar.reference_len(), 3 + 2 + 4 + 1);
    assert_eq!(cigar.query_len(), 2 + 3 + 1 + 1);
}

/// Zero-length runs vanish and their neighbours merge.
#[test]
fn add_operation_drops_empty_runs_and_merges() {
    let cigar: Cigar = "2M0I3M".parse().unwrap();
    assert_eq!(ops(&cigar), vec![(5, 'M')]);

    let mut cigar = Cigar::default();
    cigar.add_operation(0, CigarOp::Del);
    cigar.add_operation(2, CigarOp::SoftClip);
    cigar.add_operation(1, CigarOp::SoftClip);
    assert_eq!(ops(&cigar), vec![(3, 'S')]);
}

#[test]
fn rejects_malformed_strings() {
    assert_eq!("".parse::<Cigar>(), Err(ParseCigarError::Empty));
    assert!(matches!(
        "M".parse::<Cigar>(),
        Err(ParseCigarError::MissingLength { op: 'M', .. })
    ));
    assert!(matches!(
        "3Q".parse::<Cigar>(),
        Err(ParseCigarError::UnknownOp { op: 'Q', .. })
    ));
    assert!(matches!(
        "3M12".parse::<Cigar>(),
        Err(ParseCigarError::TrailingLength { .. })
    ));
    assert!(matches!(
        "99999999999M".parse::<Cigar>(),
        Err(ParseCigarError::InvalidLength { .. })
    ));
}
