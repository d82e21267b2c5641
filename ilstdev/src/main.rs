mod application;
mod presentation {
    pub mod cli;
}

use ilst_core::Result;

fn main() -> Result<()> {
    application::run()
}
