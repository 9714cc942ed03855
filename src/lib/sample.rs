//! Grouping of reads by sample.
//!
//! A [`SampleMap`] assigns a dense sample id to every distinct `SM` value seen across one or
//! more alignment sources, and remembers which read group of which source maps to which
//! sample. Keys are `"<source>/<read group id>"`, plus a bare `"<source>"` key for reads that
//! carry no `RG` tag when the source has no usable read groups or exactly one.

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use log::debug;
use noodles::sam::Header;
use noodles::sam::header::record::value::map::read_group::tag as rg_tag;

/// Maps `(source, read group)` pairs to dense sample ids.
#[derive(Debug, Default, Clone)]
pub struct SampleMap {
    read_group_to_sample: HashMap<String, usize>,
    sample_to_id: HashMap<String, usize>,
    samples: Vec<String>,
}

impl SampleMap {
    /// Creates an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the read groups of one source.
    ///
    /// Read groups are visited in header order and the scan stops at the first one without
    /// an `SM` field. Returns the number of read groups visited before that point.
    ///
    /// With no header, or no usable read group, the source itself is used as the sample
    /// name. With exactly one usable read group, reads without an `RG` tag from this source
    /// are also assigned to its sample.
    pub fn add(&mut self, source: &str, header: Option<&Header>) -> usize {
        let Some(header) = header else {
            self.add_pair(source, source);
            return 0;
        };

        let mut n = 0;
        let mut first_sample: Option<String> = None;
        for (id, read_group) in header.read_groups() {
            let Some(sample) = read_group.other_fields().get(&rg_tag::SAMPLE) else {
                debug!("{source}: read group {id} has no SM; ignoring the remaining read groups");
                break;
            };
            let sample = sample.to_string();
            self.add_pair(&format!("{source}/{id}"), &sample);
            first_sample.get_or_insert(sample);
            n += 1;
        }

        match (n, first_sample) {
            (0, _) => self.add_pair(source, source),
            (1, Some(sample)) => self.add_pair(source, &sample),
            _ => false,
        };
        n
    }

    /// Sample id for a read from `source` with the given `RG` value.
    ///
    /// Reads without a read group are looked up under the bare source key.
    #[must_use]
    pub fn lookup(&self, source: &str, read_group: Option<&str>) -> Option<usize> {
        match read_group {
            Some(rg) => self.read_group_to_sample.get(&format!("{source}/{rg}")).copied(),
            None => self.read_group_to_sample.get(source).copied(),
        }
    }

    /// Sample names, indexed by sample id.
    #[must_use]
    pub fn samples(&self) -> &[String] {
        &self.samples
    }

    /// Name of the sample with id `id`.
    #[must_use]
    pub fn sample_name(&self, id: usize) -> Option<&str> {
        self.samples.get(id).map(String::as_str)
    }

    /// Number of distinct samples.
    #[must_use]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Returns true if no sample has been registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Maps `key` to `sample` unless `key` is already present. Returns whether it was added.
    fn add_pair(&mut self, key: &str, sample: &str) -> bool {
        let Entry::Vacant(slot) = self.read_group_to_sample.entry(key.to_string()) else {
            debug!("Duplicate read group key {key}; keeping the first mapping");
            return false;
        };

        let id = match self.sample_to_id.get(sample) {
            Some(&id) => id,
            None => {
                let id = self.samples.len();
                self.samples.push(sample.to_string());
                self.sample_to_id.insert(sample.to_string(), id);
                id
            }
        };
        slot.insert(id);
        true
    }
}
