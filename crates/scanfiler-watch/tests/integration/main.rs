//! Integration tests for scanfiler-watch
//!
//! Every port is replaced by an in-memory fake. Tests run on a paused tokio
//! clock, so retry and settle delays complete instantly while elapsed time
//! can still be asserted.


mod test_pipeline;
mod test_watch_loop;
