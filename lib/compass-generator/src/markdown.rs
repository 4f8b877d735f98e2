//! Markdown body of a generated service.

use std::fs;
use std::path::Path;

use catalog_templating::{TemplateContext, Templates};
use serde::Serialize;

use crate::component::{last_segment, ComponentConfig, CustomFieldType, LinkType};
use crate::dependencies::ResolvedDependency;
use crate::errors::{GeneratorError, GeneratorResult};
use crate::sanitize::{escape_table_cell, sanitize_markdown_text, sanitize_url};

pub const ARCHITECTURE_DIAGRAM: &str = "## Architecture diagram\n\n<NodeGraph />";

const NO_DEPENDENCIES: &str = "No known dependencies.";

const FILE_TEMPLATE_NAME: &str = "markdown";

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MarkdownLink {
    pub text: String,
    pub url: String,
}

impl MarkdownLink {
    fn new<T: Into<String>, U: Into<String>>(text: T, url: U) -> Self {
        Self {
            text: text.into(),
            url: url.into(),
        }
    }
}

/// Component links grouped by category, as given by the component. Nothing here is sanitized.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct StructuredLinks {
    pub compass: Vec<MarkdownLink>,
    pub development: Vec<MarkdownLink>,
    pub operations: Vec<MarkdownLink>,
    pub documentation: Vec<MarkdownLink>,
    pub other: Vec<MarkdownLink>,
}

impl StructuredLinks {
    pub fn build(config: &ComponentConfig, compass_url: &str) -> Self {
        let compass_url = compass_url.trim_end_matches('/');
        let mut links = StructuredLinks::default();

        let component_url = match &config.id {
            Some(id) => format!("{compass_url}/component/{}", last_segment(id)),
            None => format!("{compass_url}/components"),
        };
        links
            .compass
            .push(MarkdownLink::new("Atlassian Compass Component", component_url));

        if let Some(owner_id) = &config.owner_id {
            links.compass.push(MarkdownLink::new(
                "Atlassian Compass Team",
                format!("{compass_url}/people/team/{}", last_segment(owner_id)),
            ));
        }

        for link in &config.links {
            let text = link
                .name
                .clone()
                .unwrap_or_else(|| sentence_case(link.link_type.as_str()));
            let bucket = match link.link_type {
                LinkType::Repository | LinkType::Project => &mut links.development,
                LinkType::Dashboard | LinkType::OnCall | LinkType::ChatChannel => {
                    &mut links.operations
                }
                LinkType::Document => &mut links.documentation,
                LinkType::OtherLink | LinkType::Other(_) => &mut links.other,
            };
            bucket.push(MarkdownLink::new(text, link.url.clone()));
        }

        links
    }

    /// Non-empty categories with their headings, in rendering order.
    pub fn sections(&self) -> impl Iterator<Item = (&'static str, &[MarkdownLink])> + '_ {
        [
            ("Compass", self.compass.as_slice()),
            ("Development", self.development.as_slice()),
            ("Operations", self.operations.as_slice()),
            ("Documentation", self.documentation.as_slice()),
            ("Other", self.other.as_slice()),
        ]
        .into_iter()
        .filter(|(_, links)| !links.is_empty())
    }
}

/// Produces the markdown body of a service.
pub trait MarkdownTemplate: Send + Sync {
    fn render(
        &self,
        config: &ComponentConfig,
        dependencies: &[ResolvedDependency],
        links: &StructuredLinks,
    ) -> GeneratorResult<String>;
}

impl<F> MarkdownTemplate for F
where
    F: Fn(&ComponentConfig, &[ResolvedDependency], &StructuredLinks) -> String + Send + Sync,
{
    fn render(
        &self,
        config: &ComponentConfig,
        dependencies: &[ResolvedDependency],
        links: &StructuredLinks,
    ) -> GeneratorResult<String> {
        Ok(self(config, dependencies, links))
    }
}

/// Links, custom fields, dependencies and the architecture diagram, with all component text
/// escaped.
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultTemplate;

impl MarkdownTemplate for DefaultTemplate {
    fn render(
        &self,
        config: &ComponentConfig,
        dependencies: &[ResolvedDependency],
        links: &StructuredLinks,
    ) -> GeneratorResult<String> {
        let mut sections = Vec::new();

        let links = render_links(links);
        if !links.is_empty() {
            sections.push(format!("## Links\n\n{links}"));
        }

        if !config.custom_fields.is_empty() {
            let mut table = String::from("## Custom Fields\n\n| Field | Value |\n| --- | --- |");
            for field in &config.custom_fields {
                let value = match field.field_type {
                    CustomFieldType::Boolean if field.value == "true" => "✅".to_string(),
                    CustomFieldType::Boolean => "❌".to_string(),
                    _ => escape_table_cell(&field.value),
                };
                table.push_str(&format!("\n| {} | {} |", escape_table_cell(&field.name), value));
            }
            sections.push(table);
        }

        let dependencies = if dependencies.is_empty() {
            NO_DEPENDENCIES.to_string()
        } else {
            dependencies
                .iter()
                .map(|d| {
                    format!(
                        "* [{}](../../{}/)",
                        sanitize_markdown_text(&d.name),
                        d.id
                    )
                })
                .collect::<Vec<_>>()
                .join("\n")
        };
        sections.push(format!("## Dependencies\n\n{dependencies}"));

        sections.push(ARCHITECTURE_DIAGRAM.to_string());

        Ok(sections.join("\n\n"))
    }
}

fn render_links(links: &StructuredLinks) -> String {
    let mut rendered = Vec::new();
    for (heading, category) in links.sections() {
        let items: Vec<String> = category
            .iter()
            .filter_map(|link| {
                let url = sanitize_url(&link.url);
                if url.is_empty() {
                    return None;
                }
                Some(format!("* [{}]({url})", sanitize_markdown_text(&link.text)))
            })
            .collect();

        if !items.is_empty() {
            rendered.push(format!("### {heading}\n\n{}", items.join("\n")));
        }
    }
    rendered.join("\n\n")
}

/// A minijinja template read from a file. The context holds `component`, `dependencies` and
/// `links`.
#[derive(Debug)]
pub struct FileTemplate {
    templates: Templates<'static>,
}

impl FileTemplate {
    pub fn new(source: String) -> GeneratorResult<Self> {
        Ok(Self {
            templates: Templates::new_with_template(FILE_TEMPLATE_NAME, source)?,
        })
    }

    pub fn from_path(path: &Path) -> GeneratorResult<Self> {
        let source = fs::read_to_string(path).map_err(|source| GeneratorError::ReadFile {
            path: path.to_path_buf(),
            source,
        })?;
        Self::new(source)
    }
}

impl MarkdownTemplate for FileTemplate {
    fn render(
        &self,
        config: &ComponentConfig,
        dependencies: &[ResolvedDependency],
        links: &StructuredLinks,
    ) -> GeneratorResult<String> {
        let mut context = TemplateContext::new();
        context.insert("component", config)?;
        context.insert("dependencies", dependencies)?;
        context.insert("links", links)?;
        Ok(self.templates.render(FILE_TEMPLATE_NAME, &context)?)
    }
}

/// `CHAT_CHANNEL` to `Chat channel`, `runbookLink` to `Runbook link`.
pub fn sentence_case(value: &str) -> String {
    let mut words: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut previous: Option<char> = None;

    for c in value.chars() {
        if c == '_' || c == '-' || c.is_whitespace() {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
        } else {
            if c.is_uppercase() && previous.is_some_and(char::is_lowercase) && !current.is_empty()
            {
                words.push(std::mem::take(&mut current));
            }
            current.extend(c.to_lowercase());
        }
        previous = Some(c);
    }
    if !current.is_empty() {
        words.push(current);
    }

    let sentence = words.join(" ");
    let mut chars = sentence.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use crate::component::{ComponentConfig, CustomField, CustomFieldType, Link, LinkType};
    use crate::dependencies::ResolvedDependency;
    use crate::markdown::{
        sentence_case, DefaultTemplate, FileTemplate, MarkdownTemplate, StructuredLinks,
    };

    fn link(link_type: LinkType, url: &str, name: Option<&str>) -> Link {
        Link {
            link_type,
            url: url.to_string(),
            name: name.map(str::to_string),
        }
    }

    #[test_case("CHAT_CHANNEL", "Chat channel")]
    #[test_case("REPOSITORY", "Repository")]
    #[test_case("OTHER_LINK", "Other link")]
    #[test_case("runbookLink", "Runbook link")]
    #[test_case("", "")]
    fn sentence_cases(value: &str, expected: &str) {
        assert_eq!(expected, sentence_case(value));
    }

    #[test]
    fn links_are_grouped_compass_first() {
        let mut config = ComponentConfig::new("orders-api");
        config.id = Some("ari:cloud:compass:site:component/abc/orders-1".to_string());
        config.owner_id = Some("ari:cloud:teams::team/team-1".to_string());
        config.links = vec![
            link(LinkType::ChatChannel, "https://chat.example.com", None),
            link(LinkType::Repository, "https://github.com/acme/orders", Some("Source")),
            link(LinkType::Other("RUNBOOK".to_string()), "https://wiki/runbook", None),
        ];

        let links = StructuredLinks::build(&config, "https://acme.atlassian.net/compass/");
        assert_eq!(
            "https://acme.atlassian.net/compass/component/orders-1",
            links.compass[0].url
        );
        assert_eq!(
            "https://acme.atlassian.net/compass/people/team/team-1",
            links.compass[1].url
        );
        assert_eq!("Source", links.development[0].text);
        assert_eq!("Chat channel", links.operations[0].text);
        assert_eq!("Runbook", links.other[0].text);

        let headings: Vec<_> = links.sections().map(|(h, _)| h).collect();
        assert_eq!(vec!["Compass", "Development", "Operations", "Other"], headings);
    }

    #[test]
    fn component_without_id_links_to_component_list() {
        let config = ComponentConfig::new("orders-api");
        let links = StructuredLinks::build(&config, "https://acme.atlassian.net/compass");
        assert_eq!(
            "https://acme.atlassian.net/compass/components",
            links.compass[0].url
        );
        assert_eq!(1, links.compass.len());
    }

    #[test]
    fn unsafe_links_are_omitted_and_text_escaped() {
        let mut config = ComponentConfig::new("orders-api");
        config.links = vec![
            link(LinkType::Document, "javascript:alert(1)", Some("Evil")),
            link(LinkType::Document, "https://docs.example.com/a(b)", Some("[Docs]")),
        ];

        let links = StructuredLinks::build(&config, "https://acme.atlassian.net/compass");
        let markdown = DefaultTemplate.render(&config, &[], &links).unwrap();

        assert!(!markdown.contains("javascript"));
        assert!(markdown.contains("* [\\[Docs\\]](https://docs.example.com/a%28b%29)"));
    }

    #[test]
    fn custom_fields_table() {
        let mut config = ComponentConfig::new("orders-api");
        config.custom_fields = vec![
            CustomField {
                field_type: CustomFieldType::Boolean,
                name: "PCI".to_string(),
                value: "true".to_string(),
            },
            CustomField {
                field_type: CustomFieldType::Boolean,
                name: "GDPR".to_string(),
                value: "no".to_string(),
            },
            CustomField {
                field_type: CustomFieldType::Text,
                name: "Notes".to_string(),
                value: "a | b".to_string(),
            },
        ];

        let markdown = DefaultTemplate
            .render(&config, &[], &StructuredLinks::default())
            .unwrap();
        assert!(markdown.contains("| PCI | ✅ |"));
        assert!(markdown.contains("| GDPR | ❌ |"));
        assert!(markdown.contains("| Notes | a \\| b |"));
    }

    #[test]
    fn sections_keep_their_order() {
        let config = ComponentConfig::new("orders-api");
        let links = StructuredLinks::build(&config, "https://acme.atlassian.net/compass");
        let dependencies = vec![ResolvedDependency {
            id: "payments".to_string(),
            name: "Payments".to_string(),
        }];

        let markdown = DefaultTemplate.render(&config, &dependencies, &links).unwrap();
        let links_at = markdown.find("## Links").unwrap();
        let dependencies_at = markdown.find("## Dependencies").unwrap();
        let diagram_at = markdown.find("## Architecture diagram").unwrap();
        assert!(links_at < dependencies_at && dependencies_at < diagram_at);
        assert!(markdown.contains("* [Payments](../../payments/)"));
        assert!(!markdown.contains("No known dependencies."));
    }

    #[test]
    fn closures_are_templates() {
        let template = |config: &ComponentConfig, _: &[ResolvedDependency], links: &StructuredLinks| {
            format!("# {} ({} compass links)", config.name, links.compass.len())
        };

        let config = ComponentConfig::new("orders-api");
        let links = StructuredLinks::build(&config, "https://acme.atlassian.net/compass");
        assert_eq!(
            "# orders-api (1 compass links)",
            template.render(&config, &[], &links).unwrap()
        );
    }

    #[test]
    fn file_template_sees_raw_links() {
        let template = FileTemplate::new(
            "# {{ component.name }}\n{% for l in links.documentation %}{{ l.text }} -> {{ l.url }}\n{% endfor %}"
                .to_string(),
        )
        .unwrap();

        let mut config = ComponentConfig::new("orders-api");
        config.links = vec![link(LinkType::Document, "https://docs/a(b)", Some("<Docs>"))];
        let links = StructuredLinks::build(&config, "https://acme.atlassian.net/compass");

        assert_eq!(
            "# orders-api\n<Docs> -> https://docs/a(b)\n",
            template.render(&config, &[], &links).unwrap()
        );
    }

    #[test]
    fn minimal_component_markdown() {
        let config = ComponentConfig::new("Orders");
        let links = StructuredLinks::build(&config, "https://acme.atlassian.net/compass");
        let payments = ResolvedDependency {
            id: "payments".to_string(),
            name: "Payments".to_string(),
        };

        for (suffix, dependencies) in [
            ("no_dependencies", vec![]),
            ("one_dependency", vec![payments]),
        ] {
            testing::set_snapshot_suffix!("{}", suffix);
            let markdown = DefaultTemplate
                .render(&config, &dependencies, &links)
                .unwrap();
            insta::assert_snapshot!("minimal_component_markdown", markdown);
        }
    }
}
