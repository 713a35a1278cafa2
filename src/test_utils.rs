//! Test fixtures for building note tracks.
