pub mod json;
pub mod terminal;

use crate::aggregator::ScanBundle;

pub trait Reporter {
    fn report(&self, bundle: &ScanBundle) -> String;
}
