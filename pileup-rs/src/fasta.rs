use crate::types::{HashMap, HashMapExt};
use anyhow::Result;
use needletail::parse_fastx_file;
use std::path::Path;

/// In-memory reference sequences keyed by the first word of the FASTA header.
#[derive(Debug, Default)]
pub struct FastaDb {
    seqs: HashMap<String, Vec<u8>>,
}

impl FastaDb {
    pub fn load(path: &Path) -> Result<Self> {
        let mut reader = parse_fastx_file(path)
            .map_err(|e| anyhow::anyhow!("failed to open FASTA {}: {}", path.display(), e))?;
        let mut seqs: HashMap<String, Vec<u8>> = HashMap::new();

        while let Some(result) = reader.next() {
            let record = result
                .map_err(|e| anyhow::anyhow!("failed to parse FASTA record: {}", e))?;
            let id = String::from_utf8_lossy(record.id());
            let name = id.split_whitespace().next().unwrap_or("").to_string();
            let mut seq = record.seq().to_vec();
            seq.make_ascii_uppercase();
            seqs.insert(name, seq);
        }

        tracing::debug!(sequences = seqs.len(), "loaded reference FASTA");
        Ok(Self { seqs })
    }

    /// Reference base at a 0-based position.
    pub fn base_at(&self, seqname: &str, position: u64) -> Option<u8> {
        let seq = self.seqs.get(seqname)?;
        usize::try_from(position)
            .ok()
            .and_then(|i| seq.get(i).copied())
    }
}
