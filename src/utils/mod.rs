//! Small ambient helpers shared across the IO and process layers.

/// Extracts the "molecular ID" portion of a FASTQ header: the part that
/// should be identical between a pair's forward and reverse mates, with the
/// `/1`, `/2`, or Illumina `" 1:N:..."`/`" 2:N:..."` side marker stripped.
///
/// Handles modern Illumina (`@id 1:N:0:index`), legacy Illumina (`@id/1`),
/// and bare headers with no recognizable side marker (returned unchanged).
pub fn molecular_id(header: &str) -> &str {
    if let Some(space) = header.find(' ') {
        &header[..space]
    } else if let Some(slash) = header.rfind('/') {
        let (id, side) = header.split_at(slash);
        if side.len() == 2 && matches!(side.as_bytes()[1], b'1' | b'2') { id } else { header }
    } else {
        header
    }
}

/// Checks that two mates share a molecular ID.
pub fn check_paired_headers(header1: &str, header2: &str) -> Result<(), std::io::Error> {
    let id1 = molecular_id(header1);
    let id2 = molecular_id(header2);
    if id1 == id2 {
        Ok(())
    } else {
        Err(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!("paired read IDs out of sync:\n\t{header1}\n\t{header2}"),
        ))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn strips_modern_illumina_side_marker() {
        assert_eq!(molecular_id("SIM:1:FCX:1:15:6329:1045 1:N:0:ATCACG"), "SIM:1:FCX:1:15:6329:1045");
    }

    #[test]
    fn strips_legacy_slash_side_marker() {
        assert_eq!(molecular_id("SIM:1:FCX:1:15:6329:1045/1"), "SIM:1:FCX:1:15:6329:1045");
    }

    #[test]
    fn bare_header_is_unchanged() {
        assert_eq!(molecular_id("read42"), "read42");
    }

    #[test]
    fn matching_ids_pass_and_mismatched_ids_fail() {
        assert!(check_paired_headers("a/1", "a/2").is_ok());
        assert!(check_paired_headers("a/1", "b/2").is_err());
    }
}
