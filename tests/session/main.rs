mod common;

mod evaluate;
mod pause;
mod reload;
mod snapshot;
