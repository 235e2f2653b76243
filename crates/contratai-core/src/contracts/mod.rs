//! Contract catalogue and templates

mod catalogue;

pub use catalogue::{
    ensure_template_index, load_template, template_path, ContractCatalogue, ContractSpec,
};
