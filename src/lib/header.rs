//! @PG bookkeeping for headers of restored BAM files.

use anyhow::Result;
use bstr::BString;
use noodles::sam::Header;
use noodles::sam::header::record::value::Map;
use noodles::sam::header::record::value::map::Program;
use noodles::sam::header::record::value::map::program::tag;
use std::collections::HashSet;

/// Program name recorded in @PG lines.
pub const PROGRAM_NAME: &str = "samspill";

/// ID of the last program in the @PG chain: the one no other program names as its `PP`.
#[must_use]
pub fn last_program_id(header: &Header) -> Option<String> {
    let programs = header.programs();
    let program_map = programs.as_ref();

    let referenced: HashSet<&[u8]> = program_map
        .values()
        .filter_map(|pg| pg.other_fields().get(&tag::PREVIOUS_PROGRAM_ID))
        .map(|pp| pp.as_slice())
        .collect();

    program_map
        .keys()
        .find(|id| !referenced.contains(id.as_slice()))
        .or_else(|| program_map.keys().next())
        .map(|id| String::from_utf8_lossy(id).to_string())
}

/// `base_id`, or `base_id.N` with the smallest N that is not already a program ID.
#[must_use]
pub fn unique_program_id(header: &Header, base_id: &str) -> String {
    let programs = header.programs();
    let program_map = programs.as_ref();

    if !program_map.contains_key(base_id.as_bytes()) {
        return base_id.to_string();
    }
    (1..)
        .map(|i| format!("{base_id}.{i}"))
        .find(|candidate| !program_map.contains_key(candidate.as_bytes()))
        .unwrap_or_else(|| base_id.to_string())
}

/// Appends a @PG record for this program, chained to the previous last program.
///
/// # Errors
///
/// Returns an error if the program record cannot be built or added.
pub fn add_pg_record(mut header: Header, version: &str, command_line: &str) -> Result<Header> {
    let previous = last_program_id(&header);
    let id = unique_program_id(&header, PROGRAM_NAME);

    let mut builder = Map::<Program>::builder()
        .insert(tag::NAME, PROGRAM_NAME)
        .insert(tag::VERSION, version)
        .insert(tag::COMMAND_LINE, command_line);
    if let Some(pp) = previous.as_deref() {
        builder = builder.insert(tag::PREVIOUS_PROGRAM_ID, pp);
    }

    header.programs_mut().add(BString::from(id), builder.build()?)?;
    Ok(header)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_programs(ids: &[(&str, Option<&str>)]) -> Header {
        let mut header = Header::default();
        for (id, pp) in ids {
            let pg = match pp {
                Some(pp) => Map::<Program>::builder()
                    .insert(tag::PREVIOUS_PROGRAM_ID, *pp)
                    .build()
                    .unwrap(),
                None => Map::<Program>::default(),
            };
            header.programs_mut().add(BString::from(*id), pg).unwrap();
        }
        header
    }

    #[test]
    fn test_last_program_id() {
        assert_eq!(last_program_id(&Header::default()), None);
        assert_eq!(last_program_id(&with_programs(&[("bwa", None)])).as_deref(), Some("bwa"));
        let chained = with_programs(&[("bwa", None), ("samtools", Some("bwa"))]);
        assert_eq!(last_program_id(&chained).as_deref(), Some("samtools"));
    }

    #[test]
    fn test_unique_program_id() {
        assert_eq!(unique_program_id(&Header::default(), "samspill"), "samspill");
        let taken = with_programs(&[("samspill", None), ("samspill.1", None)]);
        assert_eq!(unique_program_id(&taken, "samspill"), "samspill.2");
    }

    #[test]
    fn test_add_pg_record_chains_previous() {
        let header = with_programs(&[("bwa", None)]);
        let header = add_pg_record(header, "0.1.0", "samspill restore -i x").unwrap();
        let programs = header.programs();
        let pg = programs.as_ref().get(b"samspill".as_slice()).unwrap();
        assert_eq!(
            pg.other_fields().get(&tag::PREVIOUS_PROGRAM_ID).map(|v| v.to_string()).as_deref(),
            Some("bwa")
        );
        assert_eq!(
            pg.other_fields().get(&tag::COMMAND_LINE).map(|v| v.to_string()).as_deref(),
            Some("samspill restore -i x")
        );
    }
}
