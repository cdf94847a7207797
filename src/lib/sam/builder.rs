//! Builder for test SAM/BAM records and files.
//!
//! [`SamBuilder`] owns a header with the human contigs `chr1`..`chr22`, `chrX`, `chrY`
//! and `chrM`, a single read group and a `@PG` record, and accumulates the pairs and
//! fragments added through [`PairBuilder`] and [`FragBuilder`]. Bases are deterministic
//! so that files written in tests are reproducible.
//!
//! ```rust
//! use samfilter_lib::sam::builder::SamBuilder;
//!
//! let mut builder = SamBuilder::with_read_length(50);
//! let (r1, r2) = builder.add_pair().name("q1").start1(100).start2(300).build();
//! let frag = builder.add_frag().name("f1").contig(2).start(10).build();
//!
//! assert_eq!(builder.records().len(), 3);
//! assert_eq!(r1.name(), r2.name());
//! assert_eq!(frag.reference_sequence_id(), Some(2));
//! ```

use std::fs::File;
use std::io::{BufWriter, Write};
use std::num::NonZeroUsize;
use std::path::Path;

use anyhow::{Context, Result};
use bstr::BString;
use noodles::core::Position;
use noodles::sam::Header;
use noodles::sam::alignment::io::Write as AlignmentWrite;
use noodles::sam::alignment::record::cigar::Op;
use noodles::sam::alignment::record::cigar::op::Kind;
use noodles::sam::alignment::record::data::field::Tag;
use noodles::sam::alignment::record::{Flags, MappingQuality};
use noodles::sam::alignment::record_buf::data::field::Value;
use noodles::sam::alignment::record_buf::{QualityScores, RecordBuf, Sequence};
use noodles::sam::header::record::value::Map;
use noodles::sam::header::record::value::map::{Program, ReadGroup, ReferenceSequence};
use noodles::{bam, sam};

pub const DEFAULT_READ_LENGTH: usize = 100;
pub const DEFAULT_BASE_QUALITY: u8 = 30;
pub const DEFAULT_MAPQ: u8 = 60;
pub const DEFAULT_READ_GROUP_ID: &str = "A";
pub const BUILDER_PROGRAM_ID: &str = "SamBuilder";
const REFERENCE_LENGTH: NonZeroUsize = NonZeroUsize::new(200_000_000).expect("non-zero");

/// Strand orientation for reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strand {
    Plus,
    Minus,
}

impl Strand {
    fn is_negative(self) -> bool {
        matches!(self, Strand::Minus)
    }
}

/// Accumulates test records against a fixed header.
#[derive(Debug)]
pub struct SamBuilder {
    pub header: Header,
    records: Vec<RecordBuf>,
    read_length: usize,
    counter: u64,
}

impl Default for SamBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SamBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::with_read_length(DEFAULT_READ_LENGTH)
    }

    /// Creates a builder whose reads are `read_length` bases long unless a CIGAR says
    /// otherwise.
    #[must_use]
    pub fn with_read_length(read_length: usize) -> Self {
        let mut builder = Header::builder();
        let contigs =
            (1..=22).map(|i| format!("chr{i}")).chain(["chrX", "chrY", "chrM"].map(String::from));
        for name in contigs {
            let contig = Map::<ReferenceSequence>::new(REFERENCE_LENGTH);
            builder = builder.add_reference_sequence(BString::from(name), contig);
        }
        let header = builder
            .add_read_group(BString::from(DEFAULT_READ_GROUP_ID), Map::<ReadGroup>::default())
            .add_program(BString::from(BUILDER_PROGRAM_ID), Map::<Program>::default())
            .build();

        Self { header, records: Vec::new(), read_length, counter: 0 }
    }

    /// Records added so far, in insertion order.
    #[must_use]
    pub fn records(&self) -> &[RecordBuf] {
        &self.records
    }

    /// Appends a record built elsewhere, e.g. one with hand-edited flags.
    pub fn push_record(&mut self, record: RecordBuf) {
        self.records.push(record);
    }

    #[must_use]
    pub fn add_pair(&mut self) -> PairBuilder<'_> {
        PairBuilder::new(self)
    }

    #[must_use]
    pub fn add_frag(&mut self) -> FragBuilder<'_> {
        FragBuilder::new(self)
    }

    /// Writes the header and all records to a BAM file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created or written.
    pub fn write_bam(&self, path: &Path) -> Result<()> {
        let file = File::create(path)
            .with_context(|| format!("Failed to create BAM: {}", path.display()))?;
        let mut writer = bam::io::Writer::new(file);
        writer.write_header(&self.header)?;
        for record in &self.records {
            writer.write_alignment_record(&self.header, record)?;
        }
        writer.into_inner().finish()?;
        Ok(())
    }

    /// Writes the header and all records to a SAM file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created or written.
    pub fn write_sam(&self, path: &Path) -> Result<()> {
        let file = File::create(path)
            .with_context(|| format!("Failed to create SAM: {}", path.display()))?;
        let mut writer = sam::io::Writer::new(BufWriter::new(file));
        writer.write_header(&self.header)?;
        for record in &self.records {
            writer.write_alignment_record(&self.header, record)?;
        }
        writer.get_mut().flush()?;
        Ok(())
    }

    fn next_name(&mut self) -> String {
        let name = format!("q{:04}", self.counter);
        self.counter += 1;
        name
    }

    fn bases(&self, len: usize) -> Vec<u8> {
        b"ACGT".iter().copied().cycle().take(len).collect()
    }

    /// Number of read bases implied by `cigar`, or the default read length.
    fn read_length_for(&self, cigar: Option<&[Op]>) -> usize {
        cigar.map_or(self.read_length, |ops| {
            ops.iter().filter(|op| op.kind().consumes_read()).map(|op| op.len()).sum()
        })
    }

    /// A record with name, bases, qualities and read group set and no alignment.
    fn base_record(&self, name: &str, cigar: Option<&[Op]>) -> RecordBuf {
        let len = self.read_length_for(cigar);
        let mut record = RecordBuf::default();
        *record.name_mut() = Some(BString::from(name));
        *record.sequence_mut() = Sequence::from(self.bases(len));
        *record.quality_scores_mut() = QualityScores::from(vec![DEFAULT_BASE_QUALITY; len]);
        record.data_mut().insert(Tag::READ_GROUP, Value::from(DEFAULT_READ_GROUP_ID));
        record
    }
}

/// Places `record` at `start` on `contig` with `cigar`, or an all-match CIGAR over its
/// bases.
fn align(record: &mut RecordBuf, contig: usize, start: usize, cigar: Option<Vec<Op>>) {
    let cigar = cigar.unwrap_or_else(|| vec![Op::new(Kind::Match, record.sequence().len())]);
    *record.reference_sequence_id_mut() = Some(contig);
    *record.alignment_start_mut() = Position::new(start);
    *record.cigar_mut() = cigar.into_iter().collect();
    *record.mapping_quality_mut() = MappingQuality::new(DEFAULT_MAPQ);
}

fn insert_attrs(record: &mut RecordBuf, attrs: &[(Tag, Value)]) {
    for (tag, value) in attrs {
        record.data_mut().insert(*tag, value.clone());
    }
}

fn parse_tag(tag: &str) -> Tag {
    match tag.as_bytes() {
        &[a, b] => Tag::new(a, b),
        _ => panic!("SAM tags are two characters: {tag}"),
    }
}

/// Builder for a read pair. A mate without a start is unmapped.
pub struct PairBuilder<'a> {
    parent: &'a mut SamBuilder,
    name: Option<String>,
    contig: usize,
    contig2: Option<usize>,
    start1: Option<usize>,
    start2: Option<usize>,
    cigar1: Option<Vec<Op>>,
    cigar2: Option<Vec<Op>>,
    strand1: Strand,
    strand2: Strand,
    attrs: Vec<(Tag, Value)>,
}

impl<'a> PairBuilder<'a> {
    fn new(parent: &'a mut SamBuilder) -> Self {
        Self {
            parent,
            name: None,
            contig: 0,
            contig2: None,
            start1: None,
            start2: None,
            cigar1: None,
            cigar2: None,
            strand1: Strand::Plus,
            strand2: Strand::Minus,
            attrs: Vec::new(),
        }
    }

    #[must_use]
    pub fn name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    /// Reference sequence index for both mates.
    #[must_use]
    pub fn contig(mut self, contig: usize) -> Self {
        self.contig = contig;
        self
    }

    /// Reference sequence index for R2 when it differs from R1.
    #[must_use]
    pub fn contig2(mut self, contig: usize) -> Self {
        self.contig2 = Some(contig);
        self
    }

    #[must_use]
    pub fn start1(mut self, start: usize) -> Self {
        self.start1 = Some(start);
        self
    }

    #[must_use]
    pub fn start2(mut self, start: usize) -> Self {
        self.start2 = Some(start);
        self
    }

    #[must_use]
    pub fn cigar1(mut self, cigar: &str) -> Self {
        self.cigar1 = Some(parse_cigar(cigar));
        self
    }

    #[must_use]
    pub fn cigar2(mut self, cigar: &str) -> Self {
        self.cigar2 = Some(parse_cigar(cigar));
        self
    }

    #[must_use]
    pub fn strand1(mut self, strand: Strand) -> Self {
        self.strand1 = strand;
        self
    }

    #[must_use]
    pub fn strand2(mut self, strand: Strand) -> Self {
        self.strand2 = strand;
        self
    }

    /// Adds a tag to both mates.
    #[must_use]
    pub fn attr<V: Into<Value>>(mut self, tag: &str, value: V) -> Self {
        self.attrs.push((parse_tag(tag), value.into()));
        self
    }

    /// Builds both mates, adds them to the parent and returns copies.
    #[must_use]
    pub fn build(self) -> (RecordBuf, RecordBuf) {
        let name = self.name.unwrap_or_else(|| self.parent.next_name());
        let contig2 = self.contig2.unwrap_or(self.contig);
        let mut r1 = self.parent.base_record(&name, self.cigar1.as_deref());
        let mut r2 = self.parent.base_record(&name, self.cigar2.as_deref());

        let mut flags1 = Flags::SEGMENTED | Flags::FIRST_SEGMENT;
        let mut flags2 = Flags::SEGMENTED | Flags::LAST_SEGMENT;
        match self.start1 {
            Some(start) => align(&mut r1, self.contig, start, self.cigar1),
            None => {
                flags1 |= Flags::UNMAPPED;
                flags2 |= Flags::MATE_UNMAPPED;
            }
        }
        match self.start2 {
            Some(start) => align(&mut r2, contig2, start, self.cigar2),
            None => {
                flags2 |= Flags::UNMAPPED;
                flags1 |= Flags::MATE_UNMAPPED;
            }
        }
        if self.strand1.is_negative() {
            flags1 |= Flags::REVERSE_COMPLEMENTED;
            flags2 |= Flags::MATE_REVERSE_COMPLEMENTED;
        }
        if self.strand2.is_negative() {
            flags2 |= Flags::REVERSE_COMPLEMENTED;
            flags1 |= Flags::MATE_REVERSE_COMPLEMENTED;
        }
        *r1.flags_mut() = flags1;
        *r2.flags_mut() = flags2;

        *r1.mate_reference_sequence_id_mut() = r2.reference_sequence_id();
        *r1.mate_alignment_start_mut() = r2.alignment_start();
        *r2.mate_reference_sequence_id_mut() = r1.reference_sequence_id();
        *r2.mate_alignment_start_mut() = r1.alignment_start();

        insert_attrs(&mut r1, &self.attrs);
        insert_attrs(&mut r2, &self.attrs);

        self.parent.records.push(r1.clone());
        self.parent.records.push(r2.clone());
        (r1, r2)
    }
}

/// Builder for an unpaired read. A fragment without a start is unmapped.
pub struct FragBuilder<'a> {
    parent: &'a mut SamBuilder,
    name: Option<String>,
    contig: usize,
    start: Option<usize>,
    cigar: Option<Vec<Op>>,
    strand: Strand,
    attrs: Vec<(Tag, Value)>,
}

impl<'a> FragBuilder<'a> {
    fn new(parent: &'a mut SamBuilder) -> Self {
        Self {
            parent,
            name: None,
            contig: 0,
            start: None,
            cigar: None,
            strand: Strand::Plus,
            attrs: Vec::new(),
        }
    }

    #[must_use]
    pub fn name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    #[must_use]
    pub fn contig(mut self, contig: usize) -> Self {
        self.contig = contig;
        self
    }

    #[must_use]
    pub fn start(mut self, start: usize) -> Self {
        self.start = Some(start);
        self
    }

    #[must_use]
    pub fn cigar(mut self, cigar: &str) -> Self {
        self.cigar = Some(parse_cigar(cigar));
        self
    }

    #[must_use]
    pub fn strand(mut self, strand: Strand) -> Self {
        self.strand = strand;
        self
    }

    #[must_use]
    pub fn attr<V: Into<Value>>(mut self, tag: &str, value: V) -> Self {
        self.attrs.push((parse_tag(tag), value.into()));
        self
    }

    #[must_use]
    pub fn build(self) -> RecordBuf {
        let name = self.name.unwrap_or_else(|| self.parent.next_name());
        let mut record = self.parent.base_record(&name, self.cigar.as_deref());

        let mut flags = Flags::empty();
        match self.start {
            Some(start) => align(&mut record, self.contig, start, self.cigar),
            None => flags |= Flags::UNMAPPED,
        }
        if self.strand.is_negative() {
            flags |= Flags::REVERSE_COMPLEMENTED;
        }
        *record.flags_mut() = flags;
        insert_attrs(&mut record, &self.attrs);

        self.parent.records.push(record.clone());
        record
    }
}

/// Parses a CIGAR string such as `10S90M` into operations.
///
/// # Panics
///
/// Panics on a malformed CIGAR.
#[must_use]
pub fn parse_cigar(cigar: &str) -> Vec<Op> {
    let mut ops = Vec::new();
    let mut len = 0_usize;
    for c in cigar.chars() {
        if let Some(digit) = c.to_digit(10) {
            len = len * 10 + digit as usize;
            continue;
        }
        let kind = match c {
            'M' => Kind::Match,
            'I' => Kind::Insertion,
            'D' => Kind::Deletion,
            'N' => Kind::Skip,
            'S' => Kind::SoftClip,
            'H' => Kind::HardClip,
            'P' => Kind::Pad,
            '=' => Kind::SequenceMatch,
            'X' => Kind::SequenceMismatch,
            _ => panic!("Unknown CIGAR operation '{c}' in {cigar}"),
        };
        ops.push(Op::new(kind, len));
        len = 0;
    }
    ops
}
