pub mod error;
pub mod io;
pub mod models;
pub mod stages;

pub use error::{ParseError, PrepError, Result};
pub use io::{
    find_files_by_extension, find_first_file_by_extension, list_files, parse_eaf_file,
    parse_trs_file, parse_trs_str, write_utterances_json,
};
pub use models::{RawSegment, TimeValue, TrsDocument, Utterance};
pub use stages::{
    aggregate_directory, ctm_to_textgrids, extract_segments, locate_ctm, normalize,
    process_eaf_file, process_trs_file, AlignmentInputs, BatchConfig, BatchPolicy,
    EmptyTranscriptPolicy, NormalizeConfig, SourceFormat,
};
