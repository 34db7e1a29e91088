use crate::{Hashable, Tags, WriteFailure};
use serde::{Deserialize, Serialize};
use std::io;

/// Describes an instance of an application or service that emits trace
/// data.
///
/// Equality and hashing are defined over the stored tag order. Records
/// built with [`Process::new`] hold their tags in canonical (sorted) form,
/// so two records describing the same logical process compare equal and
/// hash identically regardless of the order their tags were supplied in.
/// A record assembled by hand from unsorted tags does not carry that
/// guarantee.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Process {
    pub service_name: String,
    #[serde(default, skip_serializing_if = "Tags::is_empty")]
    pub tags: Tags,
}

// === impl Process ===

impl Process {
    /// Builds a record in canonical form.
    ///
    /// Takes ownership of the tag sequence and sorts it in place; no copy
    /// is made. Never fails; an empty sequence is fine.
    pub fn new(service_name: impl Into<String>, tags: impl Into<Tags>) -> Self {
        let mut tags = tags.into();
        tags.sort();
        Process {
            service_name: service_name.into(),
            tags,
        }
    }
}

impl Hashable for Process {
    /// Writes the raw service-name bytes followed by each tag's
    /// contribution in stored order. There is no delimiter between the
    /// segments; the layout matches the deployed descriptor hash and must
    /// not change without a coordinated migration of stored hashes.
    fn hash<W: io::Write + ?Sized>(&self, w: &mut W) -> Result<(), WriteFailure> {
        w.write_all(self.service_name.as_bytes())?;
        self.tags.hash(w)
    }
}
