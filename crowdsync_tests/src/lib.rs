/*! # crowdsync tests

Harness for end-to-end tests of the crowdsync engine, with a synthetic clock so that every
frame, debounce window and sweep interval is deterministic.
*/

pub mod stepper;

#[cfg(test)]
mod scenarios;
