use miette::Diagnostic;
use smol_str::SmolStr;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum RenderError {
    #[error("no page named {page}")]
    #[diagnostic(code(render::unknown_page))]
    UnknownPage { page: SmolStr },

    #[error("page {page} has no section {section}")]
    #[diagnostic(code(render::unknown_section))]
    UnknownSection { page: SmolStr, section: SmolStr },

    #[error("template error: {0}")]
    #[diagnostic(code(render::template))]
    Template(#[from] minijinja::Error),
}

pub type Result<T> = std::result::Result<T, RenderError>;
