// Domain layer - Pure traffic model, no I/O
pub mod frame;
pub mod sample;
pub mod series;
pub mod window;
