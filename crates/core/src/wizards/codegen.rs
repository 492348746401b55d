use crate::errors::Result;
use crate::options::CodeGenerateOptions;
use crate::prompt::{ConfirmPrompt, TextPrompt};
use crate::steps::{Step, StepList};
use crate::wizard::Wizard;
use async_trait::async_trait;

const TYPES: [&str; 4] = [
    CodeGenerateOptions::TYPE_PAGE_CONTENT_TYPES,
    CodeGenerateOptions::TYPE_REUSABLE_CONTENT_TYPES,
    CodeGenerateOptions::TYPE_REUSABLE_FIELD_SCHEMAS,
    CodeGenerateOptions::TYPE_CLASSES,
];

/// Asks which objects to generate code for and where
#[derive(Default)]
pub struct CodeGenerateWizard {
    options: CodeGenerateOptions,
}

impl CodeGenerateWizard {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait(?Send)]
impl Wizard for CodeGenerateWizard {
    type Options = CodeGenerateOptions;

    fn options(&self) -> &CodeGenerateOptions {
        &self.options
    }

    fn options_mut(&mut self) -> &mut CodeGenerateOptions {
        &mut self.options
    }

    async fn init_steps(&mut self, _args: &[&str]) -> Result<StepList<CodeGenerateOptions>> {
        let mut steps = StepList::new();

        steps.push(Step::select(
            "Which type?",
            TYPES.to_vec(),
            self.options.object_type.as_deref(),
            |o: &mut CodeGenerateOptions, v: &str| o.object_type = Some(v.to_string()),
        ));
        steps.push(
            Step::confirm(
                ConfirmPrompt::new("Generate provider classes?", self.options.with_provider_class),
                |o: &mut CodeGenerateOptions, v| o.with_provider_class = v,
            )
            .skip_if(|o| o.object_type.as_deref() != Some(CodeGenerateOptions::TYPE_CLASSES)),
        );
        steps.push(Step::text(
            TextPrompt::new("Use a custom namespace?").allow_empty(),
            |o: &mut CodeGenerateOptions, v| o.namespace = Some(v),
        ));
        steps.push(Step::text(
            TextPrompt::new("Enter the relative location to generate files:")
                .with_default(Some(self.options.location.as_str()))
                .validate(|v| v.starts_with('/'), "Location must start with '/'"),
            |o: &mut CodeGenerateOptions, v| o.location = v,
        ));
        steps.push(Step::text(
            TextPrompt::new("Include which object types (semicolon separated list)?")
                .with_default(Some(self.options.include.as_str())),
            |o: &mut CodeGenerateOptions, v| o.include = v,
        ));
        steps.push(Step::text(
            TextPrompt::new("Exclude which object types (semicolon separated list)?")
                .with_default(Some(self.options.exclude.as_str())),
            |o: &mut CodeGenerateOptions, v| o.exclude = v,
        ));

        Ok(steps)
    }
}
