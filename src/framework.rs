/// Target stack the generated component is written for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Framework {
    #[default]
    HtmlCss,
    HtmlTailwind,
    HtmlBootstrap,
    HtmlCssJs,
    HtmlTailwindBootstrap,
}

impl Framework {
    /// Identifier embedded in the prompt and accepted on the command line.
    pub fn as_str(&self) -> &'static str {
        match self {
            Framework::HtmlCss => "html-css",
            Framework::HtmlTailwind => "html-tailwind",
            Framework::HtmlBootstrap => "html-bootstrap",
            Framework::HtmlCssJs => "html-css-js",
            Framework::HtmlTailwindBootstrap => "html-tailwind-bootstrap",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "html-css" => Some(Framework::HtmlCss),
            "html-tailwind" => Some(Framework::HtmlTailwind),
            "html-bootstrap" => Some(Framework::HtmlBootstrap),
            "html-css-js" => Some(Framework::HtmlCssJs),
            "html-tailwind-bootstrap" => Some(Framework::HtmlTailwindBootstrap),
            _ => None,
        }
    }

    pub fn all() -> Vec<Framework> {
        vec![
            Framework::HtmlCss,
            Framework::HtmlTailwind,
            Framework::HtmlBootstrap,
            Framework::HtmlCssJs,
            Framework::HtmlTailwindBootstrap,
        ]
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Framework::HtmlCss => "HTML+CSS",
            Framework::HtmlTailwind => "HTML + Tailwind CSS",
            Framework::HtmlBootstrap => "HTML + Bootstrap",
            Framework::HtmlCssJs => "HTML + CSS + JS",
            Framework::HtmlTailwindBootstrap => "HTML + tailwind CSS + Bootstrap",
        }
    }
}
