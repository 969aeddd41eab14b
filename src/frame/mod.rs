pub mod air_quality_frame;
