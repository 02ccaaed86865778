//! Tests for backups and text export
