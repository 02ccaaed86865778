//! Tests for the interactive menu
