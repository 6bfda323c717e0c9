use crate::error::SubmitError;
use crate::framework::Framework;

/// Parameters of one generation, validated at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    prompt_text: String,
    framework: Framework,
}

impl GenerationRequest {
    pub fn new(prompt_text: &str, framework: Framework) -> Result<Self, SubmitError> {
        let prompt_text = prompt_text.trim();
        if prompt_text.is_empty() {
            return Err(SubmitError::EmptyPrompt);
        }
        Ok(Self {
            prompt_text: prompt_text.to_string(),
            framework,
        })
    }

    pub fn prompt_text(&self) -> &str {
        &self.prompt_text
    }

    pub fn framework(&self) -> Framework {
        self.framework
    }

    /// Full instruction sent to the model.
    pub fn build_prompt(&self) -> String {
        let mut prompt = String::new();

        prompt.push_str("You are an experienced programmer with expertise in web development and UI/UX design. ");
        prompt.push_str("You create modern, animated, and fully responsive UI components. ");
        prompt.push_str("You are highly skilled in HTML, CSS, Tailwind CSS, Bootstrap, JavaScript, React, Next.js, Vue.js, Angular, and more.\n\n");

        prompt.push_str(&format!("Now, generate a UI component for: {}\n", self.prompt_text));
        prompt.push_str(&format!("Framework to use: {}\n\n", self.framework.as_str()));

        prompt.push_str("Requirements:\n");
        prompt.push_str("The code must be clean, well-structured, and easy to understand.\n");
        prompt.push_str("Optimize for SEO where applicable.\n");
        prompt.push_str("Focus on creating a modern, animated, and responsive UI design.\n");
        prompt.push_str("Include high-quality hover effects, shadows, animations, colors, and typography.\n");
        prompt.push_str("Return ONLY the code, formatted properly in **Markdown fenced code blocks**.\n");
        prompt.push_str("Do NOT include explanations, text, comments, or anything else besides the code.\n");
        prompt.push_str("And give the whole code in a single HTML file.");

        prompt
    }
}
