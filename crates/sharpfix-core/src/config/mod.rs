//! Style settings
//!
//! Settings drive every synthesized edit: indentation unit and width, using
//! directive placement and grouping, member order, documentation and file
//! header templates.
//!
//! ## Settings Files
//!
//! - `.sharpfix.json` / `.sharpfix.jsonc`: JSON with comments and trailing
//!   commas
//! - `.sharpfix.toml`: TOML
//!
//! When no explicit path is given, the loader searches from the starting
//! directory upward until a file is found or the filesystem root is reached.
//! No file at all means defaults.
//!
//! ## Example
//!
//! ```jsonc
//! {
//!   "indentation": { "indentationSize": 4, "useTabs": false },
//!   "orderingRules": {
//!     "usingDirectivesPlacement": "outsideNamespace",
//!     "systemUsingDirectivesFirst": true,
//!     "blankLinesBetweenUsingGroups": "require",
//!     "elementOrder": ["kind", "accessibility", "constant", "static", "readonly"]
//!   },
//!   "documentationRules": {
//!     "companyName": "Contoso",
//!     "copyrightText": "Copyright (c) {companyName}. All rights reserved."
//!   }
//! }
//! ```

mod loader;
mod settings;

pub use loader::{SETTINGS_FILE_NAMES, SettingsLoader};
pub use settings::{
    BlankLinesPolicy, DocumentationSettings, EndOfFilePolicy, FileNamingConvention,
    IndentationSettings, LayoutSettings, OrderTrait, OrderingSettings, StyleSettings,
    UsingPlacement,
};
