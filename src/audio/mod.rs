pub mod clock;
pub mod midi;
pub mod output;

pub use clock::TimerThread;
pub use midi::MidiOutputHandle;
pub use output::EchoOutput;
