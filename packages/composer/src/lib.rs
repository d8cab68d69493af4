//! # ViewCompose Composer
//!
//! Merges a base view document with an ordered list of module extensions.
//!
//! ```text
//!                 ┌──────────────┐
//! base view ────▶ │   Composer   │ ────▶ Composition ──▶ ComputedView
//! extensions ───▶ │              │         (document, dependencies, diagnostics)
//!                 └──────┬───────┘
//!                        │ uses
//!        ┌───────────────┼────────────────┬──────────────┐
//!        ▼               ▼                ▼              ▼
//!   PathResolver     Directives       ZoneLocator     Position
//!   (+ PathCache)
//! ```
//!
//! ## Example
//!
//! ```
//! use viewcompose_composer::{Composer, ExtensionView, ViewIdentity};
//!
//! let base = r#"<object-views><form name="user-form"><panel name="main"/></form></object-views>"#;
//! let extension = r#"<object-views><form name="user-form" extension="true">
//!   <extend target="panel[@name='main']">
//!     <insert position="inside"><field name="age"/></insert>
//!   </extend>
//! </form></object-views>"#;
//!
//! let composition = Composer::new(ViewIdentity::new("user-form", "form"), base)
//!     .extension(ExtensionView::new("sale", extension))
//!     .compute()
//!     .unwrap();
//!
//! assert!(composition.view_xml().contains(r#"<field name="age"/>"#));
//! ```

pub mod adapter;
pub mod catalog;
pub mod composer;
pub mod computed;
pub mod diagnostics;
pub mod directives;
pub mod error;
pub mod generator;
pub mod guards;
pub mod ordering;
pub mod path;
pub mod position;
pub mod view;
pub mod zones;

pub use catalog::{ComposeJob, ViewCatalog};
pub use composer::{Composer, Composition, ExtensionView};
pub use computed::{ComputedView, COMPUTED_SUFFIX};
pub use diagnostics::{Diagnostic, DiagnosticKind};
pub use directives::{Directive, DirectiveError};
pub use error::ComposeError;
pub use generator::{generate_all, GeneratedView, CHUNK_SIZE};
pub use guards::{DenyAll, FnGuards, GuardContext, StaticGuards};
pub use ordering::order_by_modules;
pub use path::{scoped_expression, PathCache, PathError, PathResolver, ViewIdentity};
pub use position::Position;
pub use view::ViewRecord;
pub use zones::{ZoneKind, ZoneLocator};
