//! Wire messages generated from `proto/tracker_data.proto` (package `yolovr`).

include!(concat!(env!("OUT_DIR"), "/yolovr.rs"));
