use noodles::sam;

/// Reference sequence names in header order, indexed by reference sequence id.
pub fn reference_names(header: &sam::Header) -> Vec<String> {
    header
        .reference_sequences()
        .keys()
        .map(|name| name.to_string())
        .collect()
}
