use noodles::sam::alignment::record::Flags;
use pileup_rs::read_filter::{DefaultReadFilter, ReadFilter};
use pileup_rs::source::{self, RecordSource};
use pileup_rs::{
    Alignment, BaseCounts, EagerAlignment, ErrorPolicy, Indel, Locus, Pileup, PileupError,
    PileupOptions,
};

fn read(name: &str, position: u64, cigar: &str, sequence: &str) -> EagerAlignment {
    EagerAlignment::builder()
        .set_name(name)
        .set_reference_sequence_id(0)
        .set_position(position)
        .set_mapping_quality(60)
        .set_cigar(cigar.parse().unwrap())
        .set_sequence(sequence.as_bytes())
        .set_quality_scores(vec![30; sequence.len()])
        .build()
}

fn on_reference(alignment: EagerAlignment, id: usize) -> EagerAlignment {
    EagerAlignment::builder()
        .set_name(alignment.name().unwrap())
        .set_reference_sequence_id(id)
        .set_position(alignment.position())
        .set_cigar(alignment.cigar().clone())
        .set_sequence(alignment.sequence())
        .set_quality_scores(alignment.quality_scores())
        .build()
}

/// What one read looks like from inside a column.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Observed {
    name: String,
    base: u8,
    quality: u8,
    offset: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Column {
    locus: Locus,
    reads: Vec<Observed>,
}

fn drain<S: RecordSource, F: ReadFilter>(pileup: &mut Pileup<S, F>) -> Vec<Column> {
    let mut columns = Vec::new();
    while let Some(column) = pileup.next_column().unwrap() {
        for read in column.reads() {
            assert_eq!(read.reference_position(), column.position());
        }
        columns.push(Column {
            locus: column.locus(),
            reads: column
                .reads()
                .iter()
                .map(|read| Observed {
                    name: String::from_utf8_lossy(read.alignment().name().unwrap()).into_owned(),
                    base: read.base(),
                    quality: read.quality(),
                    offset: read.read_sequence_offset(),
                })
                .collect(),
        });
    }
    columns
}

fn pileup_of(records: Vec<EagerAlignment>) -> Vec<Column> {
    let mut pileup = Pileup::new(source::from_records(records), PileupOptions::default());
    drain(&mut pileup)
}

fn positions(columns: &[Column]) -> Vec<u64> {
    columns.iter().map(|c| c.locus.position).collect()
}

fn coverages(columns: &[Column]) -> Vec<usize> {
    columns.iter().map(|c| c.reads.len()).collect()
}

#[test]
fn single_match_read() {
    let columns = pileup_of(vec![read("r1", 10, "5M", "ACGTG")]);

    assert_eq!(positions(&columns), vec![10, 11, 12, 13, 14]);
    for (i, column) in columns.iter().enumerate() {
        assert_eq!(column.locus.reference_sequence_id, Some(0));
        assert_eq!(column.reads.len(), 1);
        let observed = &column.reads[0];
        assert_eq!(observed.base, b"ACGTG"[i]);
        assert_eq!(observed.quality, 30);
        assert_eq!(observed.offset, Some(i));
    }
}

#[test]
fn deletion_reports_gap() {
    let columns = pileup_of(vec![read("r1", 0, "2M1D2M", "ACGT")]);

    assert_eq!(positions(&columns), vec![0, 1, 2, 3, 4]);
    let bases: Vec<u8> = columns.iter().map(|c| c.reads[0].base).collect();
    let offsets: Vec<Option<usize>> = columns.iter().map(|c| c.reads[0].offset).collect();
    assert_eq!(bases, b"ACNGT".to_vec());
    assert_eq!(offsets, vec![Some(0), Some(1), None, Some(2), Some(3)]);
    assert_eq!(columns[2].reads[0].quality, 255);
}

#[test]
fn overlapping_reads_enter_and_leave() {
    let mut pileup = Pileup::new(
        source::from_records(vec![read("A", 0, "3M", "AAA"), read("B", 2, "3M", "CCC")]),
        PileupOptions::default(),
    );
    let columns = drain(&mut pileup);

    assert_eq!(positions(&columns), vec![0, 1, 2, 3, 4]);
    assert_eq!(coverages(&columns), vec![1, 1, 2, 1, 1]);
    let names: Vec<&str> = columns[2].reads.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["A", "B"]);
    assert_eq!(columns[3].reads[0].name, "B");

    assert_eq!(pileup.active_len(), 0);
    assert!(pileup.next_column().unwrap().is_none());
}

#[test]
fn soft_clip_shifts_first_offset() {
    let columns = pileup_of(vec![read("r1", 5, "2S3M", "XXABC")]);

    assert_eq!(columns[0].locus.position, 5);
    assert_eq!(columns[0].reads[0].base, b'A');
    assert_eq!(columns[0].reads[0].offset, Some(2));
    assert_eq!(positions(&columns), vec![5, 6, 7]);
}

#[test]
fn hard_clips_and_padding_are_invisible() {
    let columns = pileup_of(vec![read("r1", 0, "3H2M1P1M2H", "ACG")]);
    let bases: Vec<u8> = columns.iter().map(|c| c.reads[0].base).collect();
    assert_eq!(bases, b"ACG".to_vec());
}

#[test]
fn zero_span_records_never_appear() {
    let mut pileup = Pileup::new(
        source::from_records(vec![read("ins", 3, "5I", "AAAAA")]),
        PileupOptions::default(),
    );
    assert!(pileup.next_column().unwrap().is_none());
    assert_eq!(pileup.stats().zero_span, 1);

    let mut pileup = Pileup::new(
        source::from_records(vec![
            read("a", 0, "4M", "ACGT"),
            read("ins", 1, "2S", "TT"),
            read("b", 2, "2M", "GT"),
        ]),
        PileupOptions::default(),
    );
    let columns = drain(&mut pileup);
    assert_eq!(coverages(&columns), vec![1, 1, 2, 2]);
    assert!(columns.iter().flat_map(|c| &c.reads).all(|r| r.name != "ins"));
    assert_eq!(pileup.stats().zero_span, 1);
    assert_eq!(pileup.stats().admitted, 2);
}

#[test]
fn placed_unmapped_mate_is_not_an_error() {
    let mate = EagerAlignment::builder()
        .set_name("a")
        .set_flags(Flags::UNMAPPED)
        .set_reference_sequence_id(0)
        .set_position(0)
        .set_sequence(&b"TTTT"[..])
        .set_quality_scores(vec![30; 4])
        .build();
    assert!(mate.cigar().is_empty());
    let records = vec![read("a", 0, "3M", "ACG"), mate, read("b", 1, "3M", "CGT")];

    let mut pileup = Pileup::new(source::from_records(records), PileupOptions::default());
    let columns = drain(&mut pileup);
    assert_eq!(positions(&columns), vec![0, 1, 2, 3]);
    assert_eq!(coverages(&columns), vec![1, 2, 2, 1]);
    assert_eq!(pileup.stats().zero_span, 1);
    assert_eq!(pileup.stats().skipped, 0);
    assert_eq!(pileup.stats().admitted, 2);
}

#[test]
fn span_past_the_coordinate_space_is_malformed() {
    let record = read("edge", u64::MAX - 1, "5M", "ACGTA");
    assert!(record.end_position() >= record.position());

    match EagerAlignment::capture(&record) {
        Err(PileupError::MalformedCigar { name, .. }) => assert_eq!(name, "edge"),
        other => panic!("expected a malformed record, got {other:?}"),
    }
}

fn mixed_reads() -> Vec<EagerAlignment> {
    vec![
        read("r0", 0, "10M", "ACGTACGTAC"),
        read("r1", 0, "3M2D3M", "AAACCC"),
        read("r2", 2, "2S4M1I2M", "GGTTTTATT"),
        read("r3", 4, "2M3N2M", "CCGG"),
        read("r4", 4, "1M", "T"),
        read("r5", 9, "1D2M", "AC"),
        read("r6", 20, "3M", "GGG"),
        read("r7", 21, "5M2S", "CCCCCAA"),
    ]
}

#[test]
fn coverage_matches_reference_spans() {
    let records = mixed_reads();
    let columns = pileup_of(records.clone());

    let first = records.iter().map(|r| r.position()).min().unwrap();
    let last = records.iter().map(|r| r.end_position()).max().unwrap();
    assert_eq!(positions(&columns), (first..last).collect::<Vec<_>>());

    for column in &columns {
        let p = column.locus.position;
        let mut expected: Vec<String> = records
            .iter()
            .filter(|r| r.position() <= p && p < r.end_position())
            .map(|r| String::from_utf8_lossy(r.name().unwrap()).into_owned())
            .collect();
        let mut found: Vec<String> = column.reads.iter().map(|r| r.name.clone()).collect();
        expected.sort();
        found.sort();
        assert_eq!(found, expected, "reads at {p}");
    }
}

#[test]
fn gaps_always_carry_sentinels() {
    let mut pileup = Pileup::new(source::from_records(mixed_reads()), PileupOptions::default());
    while let Some(column) = pileup.next_column().unwrap() {
        for read in column.reads() {
            let (_, op) = read.cigar_op();
            if op.is_aligned() {
                let offset = read.read_sequence_offset().unwrap();
                assert_eq!(read.base(), read.alignment().sequence()[offset]);
            } else {
                assert!(read.is_deletion() || read.is_reference_skip());
                assert_eq!(read.read_sequence_offset(), None);
                assert_eq!(read.base(), b'N');
                assert_eq!(read.quality(), 255);
            }
        }
    }
}

#[test]
fn replay_is_identical() {
    let first = pileup_of(mixed_reads());
    let second = pileup_of(mixed_reads());
    assert_eq!(first, second);
}

#[test]
fn fill_gaps_controls_empty_columns() {
    let records = vec![read("a", 0, "2M", "AC"), read("b", 5, "2M", "GT")];

    let filled = pileup_of(records.clone());
    assert_eq!(positions(&filled), vec![0, 1, 2, 3, 4, 5, 6]);
    assert_eq!(coverages(&filled), vec![1, 1, 0, 0, 0, 1, 1]);

    let options = PileupOptions {
        fill_gaps: false,
        ..Default::default()
    };
    let mut pileup = Pileup::new(source::from_records(records), options);
    let sparse = drain(&mut pileup);
    assert_eq!(positions(&sparse), vec![0, 1, 5, 6]);
    assert!(sparse.iter().all(|c| !c.reads.is_empty()));
}

#[test]
fn reference_change_drains_the_window() {
    let records = vec![
        read("a", 0, "3M", "AAA"),
        read("b", 2, "4M", "CCCC"),
        on_reference(read("c", 1, "2M", "GG"), 1),
    ];
    let columns = pileup_of(records);

    let loci: Vec<(Option<usize>, u64)> = columns
        .iter()
        .map(|c| (c.locus.reference_sequence_id, c.locus.position))
        .collect();
    assert_eq!(
        loci,
        vec![
            (Some(0), 0),
            (Some(0), 1),
            (Some(0), 2),
            (Some(0), 3),
            (Some(0), 4),
            (Some(0), 5),
            (Some(1), 1),
            (Some(1), 2),
        ]
    );
    assert_eq!(columns[6].reads.len(), 1);
    assert_eq!(columns[6].reads[0].name, "c");
}

#[test]
fn out_of_order_record_fails() {
    let records = vec![read("a", 5, "2M", "AC"), read("b", 3, "2M", "GT")];
    let mut pileup = Pileup::new(source::from_records(records), PileupOptions::default());

    match pileup.next_column() {
        Err(PileupError::Unsorted {
            name,
            locus,
            previous,
        }) => {
            assert_eq!(name, "b");
            assert_eq!(locus.position, 3);
            assert_eq!(previous.position, 5);
        }
        other => panic!("expected an ordering error, got {other:?}"),
    }
    assert!(pileup.next_column().unwrap().is_none());
}

#[test]
fn out_of_order_record_is_skipped_on_request() {
    let records = vec![
        read("a", 5, "2M", "AC"),
        read("b", 3, "2M", "GT"),
        read("c", 6, "1M", "T"),
    ];
    let options = PileupOptions {
        on_error: ErrorPolicy::Skip,
        ..Default::default()
    };
    let mut pileup = Pileup::new(source::from_records(records), options);
    let columns = drain(&mut pileup);

    assert_eq!(positions(&columns), vec![5, 6]);
    assert_eq!(coverages(&columns), vec![1, 2]);
    assert_eq!(pileup.stats().skipped, 1);
    assert_eq!(pileup.stats().admitted, 2);
}

#[test]
fn sequence_length_mismatch_is_malformed() {
    let records = vec![read("a", 0, "2M", "AC"), read("bad", 1, "5M", "ACG")];
    let mut pileup = Pileup::new(source::from_records(records.clone()), PileupOptions::default());

    let mut result = pileup.next_column().map(|c| c.map(|c| c.position()));
    while let Ok(Some(_)) = result {
        result = pileup.next_column().map(|c| c.map(|c| c.position()));
    }
    let error = result.unwrap_err();
    assert!(matches!(error, PileupError::MalformedCigar { ref name, .. } if name == "bad"));
    assert!(error.is_recoverable());
    assert!(pileup.next_column().unwrap().is_none());

    let options = PileupOptions {
        on_error: ErrorPolicy::Skip,
        ..Default::default()
    };
    let mut pileup = Pileup::new(source::from_records(records), options);
    let columns = drain(&mut pileup);
    assert_eq!(positions(&columns), vec![0, 1]);
    assert_eq!(pileup.stats().skipped, 1);
}

#[test]
fn source_errors_are_always_fatal() {
    let items: Vec<std::io::Result<EagerAlignment>> = vec![
        Ok(read("a", 0, "3M", "AAA")),
        Err(std::io::Error::other("truncated block")),
    ];
    let options = PileupOptions {
        on_error: ErrorPolicy::Skip,
        ..Default::default()
    };
    let mut pileup = Pileup::new(source::Records::new(items), options);

    let error = loop {
        match pileup.next_column() {
            Ok(Some(_)) => continue,
            Ok(None) => panic!("expected an I/O error"),
            Err(e) => break e,
        }
    };
    assert!(matches!(error, PileupError::Io(_)));
    assert!(!error.is_recoverable());
}

#[test]
fn filters_drop_reads_before_admission() {
    let duplicate = EagerAlignment::builder()
        .set_name("dup")
        .set_flags(Flags::DUPLICATE)
        .set_reference_sequence_id(0)
        .set_mapping_quality(60)
        .set_position(1)
        .set_cigar("2M".parse().unwrap())
        .set_sequence(&b"CC"[..])
        .build();
    let low_mapq = EagerAlignment::builder()
        .set_name("lowq")
        .set_reference_sequence_id(0)
        .set_mapping_quality(3)
        .set_position(0)
        .set_cigar("2M".parse().unwrap())
        .set_sequence(&b"AA"[..])
        .build();
    let records = vec![read("a", 0, "3M", "AAA"), low_mapq, duplicate];

    let mut pileup = Pileup::with_filter(
        source::from_records(records),
        DefaultReadFilter::new(20),
        PileupOptions::default(),
    );
    let columns = drain(&mut pileup);
    assert_eq!(coverages(&columns), vec![1, 1, 1]);
    assert_eq!(pileup.stats().records, 3);
    assert_eq!(pileup.stats().filtered, 2);
    assert_eq!(pileup.stats().admitted, 1);
}

#[test]
fn closure_filters() {
    let records = vec![read("keep", 0, "2M", "AC"), read("drop", 0, "2M", "GT")];
    let filter = |read: &dyn Alignment| read.name() != Some(b"drop".as_slice());
    let mut pileup = Pileup::with_filter(
        source::from_records(records),
        filter,
        PileupOptions::default(),
    );
    let columns = drain(&mut pileup);
    assert!(columns.iter().all(|c| c.reads.len() == 1 && c.reads[0].name == "keep"));
}

#[test]
fn base_counts_tally_indels_and_skips() {
    let r1 = EagerAlignment::builder()
        .set_name("r1")
        .set_reference_sequence_id(0)
        .set_position(0)
        .set_cigar("2M1I2M".parse().unwrap())
        .set_sequence(&b"ACTGA"[..])
        .set_quality_scores(vec![30, 30, 30, 10, 30])
        .build();
    let records = vec![
        r1,
        read("r2", 0, "1M1N3M", "AGTT"),
        read("r3", 1, "1D2M", "GA"),
    ];
    let mut pileup = Pileup::new(source::from_records(records), PileupOptions::default());

    let mut counts = Vec::new();
    let mut low_quality = Vec::new();
    while let Some(column) = pileup.next_column().unwrap() {
        if column.position() == 1 {
            let indels: Vec<Indel> = column.reads().iter().map(|r| r.indel()).collect();
            assert_eq!(indels, vec![Indel::Insertion(1), Indel::None, Indel::None]);
            assert!(column.reads()[2].is_head());
        }
        if column.position() == 3 {
            assert!(column.reads()[0].is_tail());
        }
        counts.push(column.base_counts(None));
        low_quality.push(column.base_counts(Some(20)));
    }

    assert_eq!(
        counts[1],
        BaseCounts {
            depth: 2,
            c: 1,
            del: 1,
            ins: 1,
            ref_skip: 1,
            ..Default::default()
        }
    );
    assert_eq!(
        counts[2],
        BaseCounts {
            depth: 3,
            g: 3,
            ..Default::default()
        }
    );
    assert_eq!(
        low_quality[2],
        BaseCounts {
            depth: 3,
            g: 2,
            n: 1,
            ..Default::default()
        }
    );
    assert_eq!(counts[4].t, 1);
    assert_eq!(counts.len(), 5);
}

#[test]
fn deletion_is_announced_on_the_preceding_base() {
    let mut pileup = Pileup::new(
        source::from_records(vec![read("r1", 0, "2M2D1M", "ACG")]),
        PileupOptions::default(),
    );
    let mut indels = Vec::new();
    while let Some(column) = pileup.next_column().unwrap() {
        indels.push(column.reads()[0].indel());
    }
    assert_eq!(
        indels,
        vec![
            Indel::None,
            Indel::Deletion(2),
            Indel::None,
            Indel::None,
            Indel::None
        ]
    );
}

#[test]
fn missing_sequence_and_qualities() {
    let record = EagerAlignment::builder()
        .set_name("bare")
        .set_reference_sequence_id(0)
        .set_position(7)
        .set_cigar("3M".parse().unwrap())
        .build();
    let columns = pileup_of(vec![record]);
    assert_eq!(positions(&columns), vec![7, 8, 9]);
    for column in &columns {
        assert_eq!(column.reads[0].base, b'N');
        assert_eq!(column.reads[0].quality, 255);
        assert!(column.reads[0].offset.is_some());
    }
}

#[test]
fn empty_source_yields_nothing() {
    let mut pileup = Pileup::new(
        source::from_records(Vec::<EagerAlignment>::new()),
        PileupOptions::default(),
    );
    assert!(pileup.next_column().unwrap().is_none());
    assert_eq!(pileup.stats().records, 0);
    assert_eq!(pileup.stats().columns, 0);
}
