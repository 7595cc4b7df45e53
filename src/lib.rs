pub mod output;
pub mod page;
pub mod pipeline;
pub mod results;
pub mod settings;
pub mod sparql;
pub mod transform;
pub mod wikitext;
