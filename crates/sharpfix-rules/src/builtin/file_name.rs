//! File name must match the first type

use sharpfix_core::autofix::{CodeFixProvider, FixContext, Proposal, ReplacementMap};
use sharpfix_core::config::FileNamingConvention;
use sharpfix_core::cst::ast::{AstNode, CompilationUnit};
use sharpfix_core::{Result, ViolationDescriptor};

/// File name must match first type name
pub const FILE_NAME_MISMATCH: &str = "SA1649";

/// File name (without extension) expected for a type
pub fn expected_stem(name: &str, type_parameters: &[String], convention: FileNamingConvention) -> String {
    if type_parameters.is_empty() {
        return name.to_string();
    }
    match convention {
        FileNamingConvention::Stylecop => format!("{}{{{}}}", name, type_parameters.join(",")),
        FileNamingConvention::Metadata => format!("{}`{}", name, type_parameters.len()),
    }
}

#[derive(Debug, Default)]
pub struct FileNameCodeFixProvider;

impl FileNameCodeFixProvider {
    pub fn new() -> Self {
        Self
    }
}

impl CodeFixProvider for FileNameCodeFixProvider {
    fn fixable_rules(&self) -> &'static [&'static str] {
        &[FILE_NAME_MISMATCH]
    }

    fn title(&self) -> &'static str {
        "Rename file to match first type"
    }

    fn propose(
        &self,
        ctx: &FixContext<'_>,
        _descriptor: &ViolationDescriptor,
        _edits: &mut ReplacementMap,
    ) -> Result<Proposal> {
        let first_type = CompilationUnit::cast(ctx.root().clone())
            .and_then(|unit| unit.type_declarations().next());
        let Some((name, type_parameters)) =
            first_type.and_then(|t| Some((t.name()?, t.type_parameters())))
        else {
            return Ok(Proposal::Declined("document declares no type".into()));
        };

        let file_name = ctx.document().file_name();
        let extension = file_name.rfind('.').map_or(".cs", |i| &file_name[i..]);
        let convention = ctx.settings().documentation_rules.file_naming_convention;
        let expected = format!(
            "{}{}",
            expected_stem(&name, &type_parameters, convention),
            extension
        );
        if expected == file_name {
            return Ok(Proposal::Declined("file name already matches".into()));
        }
        tracing::debug!("Renaming {} to {}", file_name, expected);
        Ok(Proposal::Rename(expected))
    }
}
