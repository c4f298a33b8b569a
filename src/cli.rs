//! CLI domain: parse, route, output, and presentation only.
//! No domain orchestration; a single route table dispatches to the pipeline.

mod output;
mod parse;
mod presentation;
mod route;

pub use output::map_error;
pub use parse::{Cli, Commands};
pub use presentation::{
    format_apply_summary, format_dump_json, format_dump_text, format_fragments_json,
    format_fragments_text, format_installs_json, format_installs_text, format_item_list_json,
    format_item_list_text, format_status_json, format_status_text,
};
pub use route::RunContext;
