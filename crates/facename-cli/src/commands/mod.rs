pub mod batch;
pub mod generate;
pub mod init;
pub mod query;
pub mod random;
pub mod show;
pub mod stats;
pub mod train;

use comfy_table::{Cell, Table};

use facename_core::model::{Age, FacePairRecord, Gender, PairConditions};

/// Table of pairs as printed by `generate`, `random` and `batch`.
pub fn pairs_table(pairs: &[FacePairRecord]) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["Id", "Name", "Age", "Gender", "Image"]);
    for pair in pairs {
        table.add_row(vec![
            Cell::new(&pair.id),
            Cell::new(pair.full_name()),
            Cell::new(pair.age),
            Cell::new(pair.gender),
            Cell::new(&pair.image_uri),
        ]);
    }
    table
}

pub fn conditions(age: Option<Age>, gender: Option<Gender>) -> PairConditions {
    PairConditions { age, gender }
}
