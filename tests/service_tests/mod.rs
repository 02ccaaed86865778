//! Tests for the RecordService façade
