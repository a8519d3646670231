use crate::text::{self, clean_duration, normalize_whitespace};
use crate::types::{
    Alumnus, CareerEntry, EducationEntry, MemberPage, Publication, TeamMember, ToolCategories,
    ToolPage, ToolRecord,
};

use scraper::{ElementRef, Html, Node, Selector};

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("Missing required element: {0}")]
    MissingElement(String),
}

fn elem_text(element: ElementRef) -> String {
    element.text().collect::<String>()
}

/// Finds the `<h3>` whose text equals `label` and returns the first element
/// of kind `target` among its following siblings (descending into wrapper
/// elements).
fn heading_section<'a>(document: &'a Html, label: &str, target: &str) -> Option<ElementRef<'a>> {
    let h3_sel = Selector::parse("h3").unwrap();
    let target_sel = Selector::parse(target).unwrap();

    let heading = document
        .select(&h3_sel)
        .find(|e| normalize_whitespace(&elem_text(*e)) == label)?;

    for sibling in heading.next_siblings() {
        let Some(element) = ElementRef::wrap(sibling) else {
            continue;
        };
        if element.value().name() == target {
            return Some(element);
        }
        if let Some(inner) = element.select(&target_sel).next() {
            return Some(inner);
        }
    }
    None
}

fn two_column_rows(table: ElementRef) -> Vec<(String, String)> {
    let row_sel = Selector::parse("tr").unwrap();
    let cell_sel = Selector::parse("td").unwrap();

    table
        .select(&row_sel)
        .filter_map(|row| {
            let cells: Vec<_> = row.select(&cell_sel).collect();
            if cells.len() != 2 {
                return None;
            }
            Some((
                normalize_whitespace(&elem_text(cells[0])),
                normalize_whitespace(&elem_text(cells[1])),
            ))
        })
        .collect()
}

/// Extracts publication records from one result page. Records whose
/// reference string does not split into authors / journal / year are
/// dropped; the dropped count is returned for the caller to report.
pub fn parse_publications_page(html: &str) -> (Vec<Publication>, usize) {
    let document = Html::parse_document(html);
    let pub_sel = Selector::parse("div.publication").unwrap();
    let link_sel = Selector::parse("a").unwrap();
    let ref_sel = Selector::parse("p.para.bib-ref").unwrap();

    let mut records = Vec::new();
    let mut dropped = 0usize;

    for pub_div in document.select(&pub_sel) {
        match parse_publication(pub_div, &link_sel, &ref_sel) {
            Some(record) => records.push(record),
            None => dropped += 1,
        }
    }

    (records, dropped)
}

fn parse_publication(
    div: ElementRef,
    link_sel: &Selector,
    ref_sel: &Selector,
) -> Option<Publication> {
    let link = div.select(link_sel).next()?;
    let title = normalize_whitespace(&elem_text(link));
    let url = link.value().attr("href").unwrap_or("").to_string();

    let reference = div.select(ref_sel).next().map(elem_text)?;
    // "Authors. Journal, Year": split on the first period, then the first comma.
    let (authors, rest) = reference.trim().split_once('.')?;
    let (journal, year) = rest.split_once(',')?;

    Some(Publication {
        title,
        url,
        authors: normalize_whitespace(authors),
        journal: normalize_whitespace(journal),
        year: normalize_whitespace(year),
    })
}

pub fn parse_next_page_url(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let next_sel = Selector::parse("a.next.page-numbers").unwrap();
    document
        .select(&next_sel)
        .next()
        .and_then(|e| e.value().attr("href"))
        .map(str::to_string)
}

/// Extracts the alumni table from the home page. A missing section or table
/// is a whole-page failure; rows without exactly three cells are dropped and
/// counted.
pub fn parse_alumni(html: &str) -> Result<(Vec<Alumnus>, usize), ParseError> {
    let document = Html::parse_document(html);
    let section_sel = Selector::parse("div#t-alumni").unwrap();
    let table_sel = Selector::parse("table.table").unwrap();
    let row_sel = Selector::parse("tr").unwrap();
    let cell_sel = Selector::parse("td").unwrap();
    let link_sel = Selector::parse("a").unwrap();

    let section = document
        .select(&section_sel)
        .next()
        .ok_or_else(|| ParseError::MissingElement("alumni section (div#t-alumni)".to_string()))?;
    let table = section
        .select(&table_sel)
        .next()
        .ok_or_else(|| ParseError::MissingElement("alumni table".to_string()))?;

    let mut alumni = Vec::new();
    let mut dropped = 0usize;

    for row in table.select(&row_sel).skip(1) {
        let cells: Vec<_> = row.select(&cell_sel).collect();
        if cells.is_empty() {
            continue;
        }
        if cells.len() != 3 {
            dropped += 1;
            continue;
        }

        let (name, linkedin) = match cells[0].select(&link_sel).next() {
            Some(link) => (
                normalize_whitespace(&elem_text(link)),
                link.value().attr("href").unwrap_or("").to_string(),
            ),
            None => (normalize_whitespace(&elem_text(cells[0])), String::new()),
        };

        alumni.push(Alumnus {
            name,
            linkedin,
            duration: clean_duration(&elem_text(cells[1])),
            position: normalize_whitespace(&elem_text(cells[2])),
        });
    }

    Ok((alumni, dropped))
}

/// Extracts one team member profile page. Every field is optional on the
/// page; absent sections leave the field empty rather than failing.
pub fn parse_member_profile(html: &str, name: &str) -> MemberPage {
    let document = Html::parse_document(html);

    let img_sel = Selector::parse("img.img-responsive").unwrap();
    let image_url = document
        .select(&img_sel)
        .next()
        .and_then(|e| e.value().attr("src"))
        .map(str::to_string);

    let desc_sel = Selector::parse("div.desc").unwrap();
    let description = document
        .select(&desc_sel)
        .next()
        .map(|e| normalize_whitespace(&elem_text(e)))
        .unwrap_or_default();

    let research_interests = heading_section(&document, "Research Interests", "p")
        .map(|e| normalize_whitespace(&elem_text(e)))
        .unwrap_or_default();

    let professional_career = heading_section(&document, "Professional Career", "table")
        .map(two_column_rows)
        .unwrap_or_default()
        .into_iter()
        .map(|(period, position)| CareerEntry { period, position })
        .collect();

    let education = heading_section(&document, "Education", "table")
        .map(two_column_rows)
        .unwrap_or_default()
        .into_iter()
        .map(|(period, degree)| EducationEntry { period, degree })
        .collect();

    let contact_sel = Selector::parse("div.contact").unwrap();
    let tel_sel = Selector::parse("a[href^='tel:']").unwrap();
    let orcid_sel = Selector::parse("a[href*='orcid.org']").unwrap();
    let mail_sel = Selector::parse("span.imMail").unwrap();

    let mut email = String::new();
    let mut telephone = String::new();
    let mut orcid = String::new();

    for contact in document.select(&contact_sel) {
        if telephone.is_empty()
            && let Some(link) = contact.select(&tel_sel).next()
        {
            telephone = normalize_whitespace(&elem_text(link))
                .replace("Direct:", "")
                .trim()
                .to_string();
        }

        if orcid.is_empty()
            && let Some(link) = contact.select(&orcid_sel).next()
        {
            let raw = normalize_whitespace(&elem_text(link));
            orcid = text::find_orcid(&raw).unwrap_or(raw);
        }

        if email.is_empty()
            && let Some(span) = contact.select(&mail_sel).next()
        {
            let visible = normalize_whitespace(&elem_text(span));
            if visible.contains('@') {
                email = visible;
            } else if let Some(decoded) = span
                .value()
                .attr("data-mail")
                .and_then(text::decode_obfuscated_email)
            {
                email = decoded;
            }
        }
    }

    // Last resort: the first email-shaped token anywhere on the page.
    if email.is_empty() {
        let page_text = document.root_element().text().collect::<String>();
        if let Some(found) = text::find_email(&page_text) {
            email = found;
        }
    }

    MemberPage {
        member: TeamMember {
            name: name.to_string(),
            description,
            research_interests,
            professional_career,
            education,
            email,
            telephone,
            orcid,
            image: String::new(),
        },
        image_url,
    }
}

/// Extracts the tool/database listing. Entries without a name are dropped
/// and counted; a nameless record cannot name its image file.
pub fn parse_tools(html: &str) -> (Vec<ToolPage>, usize) {
    let document = Html::parse_document(html);
    let resource_sel = Selector::parse("div.resource").unwrap();

    let mut tools = Vec::new();
    let mut dropped = 0usize;

    for resource in document.select(&resource_sel) {
        match parse_tool(resource) {
            Some(page) => tools.push(page),
            None => dropped += 1,
        }
    }

    (tools, dropped)
}

fn parse_tool(resource: ElementRef) -> Option<ToolPage> {
    let name_sel = Selector::parse("h3").unwrap();
    let p_sel = Selector::parse("p").unwrap();
    let icon_sel = Selector::parse("img.icon").unwrap();
    let hidden_sel = Selector::parse("div.hidden").unwrap();
    let table_sel = Selector::parse("table").unwrap();
    let row_sel = Selector::parse("tr").unwrap();
    let cell_sel = Selector::parse("td").unwrap();
    let link_sel = Selector::parse("a").unwrap();

    let name = resource
        .select(&name_sel)
        .next()
        .map(|e| normalize_whitespace(&elem_text(e)))
        .filter(|s| !s.is_empty())?;

    let short_description = resource
        .select(&p_sel)
        .next()
        .map(|e| normalize_whitespace(&elem_text(e)))
        .unwrap_or_default();

    let image_url = resource
        .select(&icon_sel)
        .next()
        .and_then(|e| e.value().attr("src"))
        .map(str::to_string);

    let mut long_description = String::new();
    let mut code_repository = String::new();
    let mut website = String::new();
    let mut publication = String::new();
    let mut categories = ToolCategories::default();

    if let Some(hidden) = resource.select(&hidden_sel).next() {
        long_description = hidden
            .select(&p_sel)
            .next()
            .map(|e| normalize_whitespace(&elem_text(e)))
            .unwrap_or_default();

        // Second table row carries the links, columns fixed by position.
        if let Some(table) = hidden.select(&table_sel).next() {
            let rows: Vec<_> = table.select(&row_sel).collect();
            if let Some(data_row) = rows.get(1) {
                for (i, cell) in data_row.select(&cell_sel).enumerate() {
                    let Some(href) = cell
                        .select(&link_sel)
                        .next()
                        .and_then(|a| a.value().attr("href"))
                    else {
                        continue;
                    };
                    match i {
                        0 => code_repository = href.to_string(),
                        1 => website = href.to_string(),
                        2 => publication = href.to_string(),
                        _ => {}
                    }
                }
            }
        }

        categories = parse_categories(hidden);
    }

    Some(ToolPage {
        tool: ToolRecord {
            name,
            short_description,
            long_description,
            code_repository,
            website,
            publication,
            image: String::new(),
            categories,
        },
        image_url,
    })
}

// The category marker is an inline script/comment fragment; the first text
// or comment node containing "array" is tested for the literal substrings
// "database" and "tool". Kept byte-for-byte compatible with the old site.
fn parse_categories(hidden: ElementRef) -> ToolCategories {
    let mut categories = ToolCategories::default();

    let marker = hidden.descendants().find_map(|node| match node.value() {
        Node::Comment(comment) => {
            let text = comment.comment.to_string();
            text.contains("array").then_some(text)
        }
        Node::Text(text) => {
            let text = text.text.to_string();
            text.contains("array").then_some(text)
        }
        _ => None,
    });

    if let Some(marker) = marker {
        if marker.contains("database") {
            categories.database = true;
        }
        if marker.contains("tool") {
            categories.tool = true;
        }
    }

    categories
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_parse_publications_from_fixture() {
        let html =
            fs::read_to_string("fixtures/publications_page").expect("Failed to read fixture");

        let (records, dropped) = parse_publications_page(&html);

        assert_eq!(records.len(), 3, "Should parse three well-formed records");
        assert_eq!(dropped, 1, "The comma-less reference should be dropped");

        let first = &records[0];
        assert_eq!(first.title, "Decoupler enables ensemble footprint analysis");
        assert_eq!(first.url, "https://doi.org/10.1038/s41592-024-1001-1");
        assert_eq!(first.authors, "Badia-i-Mompel P, Vélez Santiago J, Braunger J");
        assert_eq!(first.journal, "Nature Methods");
        assert_eq!(first.year, "2024");
    }

    #[test]
    fn test_parse_next_page_url_present() {
        let html =
            fs::read_to_string("fixtures/publications_page").expect("Failed to read fixture");

        assert_eq!(
            parse_next_page_url(&html),
            Some("https://saezlab.org/publication/page/2/".to_string())
        );
    }

    #[test]
    fn test_parse_next_page_url_absent_on_last_page() {
        let html =
            fs::read_to_string("fixtures/publications_last_page").expect("Failed to read fixture");

        let (records, dropped) = parse_publications_page(&html);
        assert_eq!(records.len(), 2);
        assert_eq!(dropped, 0);
        assert_eq!(parse_next_page_url(&html), None, "Last page has no next link");
    }

    #[test]
    fn test_reference_without_period_is_dropped() {
        let html = r#"
            <div class="publication">
                <a href="https://doi.org/10/example">Some title</a>
                <p class="para bib-ref">Smith J, Doe A - Nature Methods, 2020</p>
            </div>
        "#;

        let (records, dropped) = parse_publications_page(html);
        assert!(records.is_empty(), "No period means no record");
        assert_eq!(dropped, 1);
    }

    #[test]
    fn test_reference_without_comma_is_dropped() {
        let html = r#"
            <div class="publication">
                <a href="https://doi.org/10/example">Some title</a>
                <p class="para bib-ref">Smith J, Doe A. Nature Methods 2020</p>
            </div>
        "#;

        let (records, dropped) = parse_publications_page(html);
        assert!(records.is_empty(), "Journal part without a comma is malformed");
        assert_eq!(dropped, 1);
    }

    #[test]
    fn test_publication_without_link_is_dropped() {
        let html = r#"
            <div class="publication">
                <p class="para bib-ref">Smith J. Nature Methods, 2020</p>
            </div>
        "#;

        let (records, dropped) = parse_publications_page(html);
        assert!(records.is_empty());
        assert_eq!(dropped, 1);
    }

    #[test]
    fn test_parse_alumni_from_fixture() {
        let html = fs::read_to_string("fixtures/homepage").expect("Failed to read fixture");

        let (alumni, dropped) = parse_alumni(&html).expect("Failed to parse alumni");

        assert_eq!(alumni.len(), 3);
        assert_eq!(dropped, 1, "The colspan row should be dropped");

        let first = &alumni[0];
        assert_eq!(first.name, "Aurélien Dugourd");
        assert_eq!(
            first.linkedin,
            "https://www.linkedin.com/in/aurelien-dugourd"
        );
        assert_eq!(first.duration, "2016-2023", "Hyphen spacing is tightened");
        assert_eq!(first.position, "PhD student, then postdoc");

        let second = &alumni[1];
        assert_eq!(second.name, "Mi Yang");
        assert_eq!(second.linkedin, "", "No link leaves the URL empty");
        assert_eq!(second.duration, "2014-2019");
    }

    #[test]
    fn test_parse_alumni_missing_section() {
        let html = "<html><body><p>nothing here</p></body></html>";
        assert!(matches!(
            parse_alumni(html),
            Err(ParseError::MissingElement(_))
        ));
    }

    #[test]
    fn test_parse_alumni_missing_table() {
        let html = r#"<div id="t-alumni"><p>table removed</p></div>"#;
        assert!(matches!(
            parse_alumni(html),
            Err(ParseError::MissingElement(_))
        ));
    }

    #[test]
    fn test_parse_member_profile_from_fixture() {
        let html = fs::read_to_string("fixtures/person_profile").expect("Failed to read fixture");

        let page = parse_member_profile(&html, "Sara Mendez");
        let member = &page.member;

        assert_eq!(member.name, "Sara Mendez");
        assert_eq!(
            member.description,
            "Sara is a postdoctoral researcher working on mechanistic models of cell signalling."
        );
        assert_eq!(
            member.research_interests,
            "Network inference, multi-omics integration and perturbation biology."
        );

        assert_eq!(member.professional_career.len(), 2);
        assert_eq!(member.professional_career[0].period, "since 2022");
        assert_eq!(
            member.professional_career[0].position,
            "Postdoctoral researcher, Heidelberg University"
        );

        assert_eq!(member.education.len(), 2);
        assert_eq!(member.education[1].degree, "BSc Biology");

        assert_eq!(member.email, "sara.mendez@uni-heidelberg.de");
        assert_eq!(member.telephone, "+49 6221 545 1234");
        assert_eq!(member.orcid, "0000-0002-8458-8001");

        assert_eq!(
            page.image_url.as_deref(),
            Some("/wp-content/uploads/2023/02/sara-mendez.jpg")
        );
    }

    #[test]
    fn test_email_visible_text_wins_over_data_mail() {
        let html = r#"
            <div class="contact">
                <span class="imMail" data-mail="other_org.x.not_used">jane@lab.org</span>
            </div>
        "#;

        let page = parse_member_profile(html, "Jane");
        assert_eq!(page.member.email, "jane@lab.org");
    }

    #[test]
    fn test_email_page_scan_fallback() {
        let html = r#"
            <div class="contact"><p>Office B220</p></div>
            <footer>Write to lab.office@uni-heidelberg.de for enquiries.</footer>
        "#;

        let page = parse_member_profile(html, "Jane");
        assert_eq!(page.member.email, "lab.office@uni-heidelberg.de");
    }

    #[test]
    fn test_member_profile_missing_sections_left_empty() {
        let html = "<html><body><h1>Sparse page</h1></body></html>";

        let page = parse_member_profile(html, "Ghost Member");
        let member = &page.member;

        assert_eq!(member.name, "Ghost Member");
        assert!(member.description.is_empty());
        assert!(member.research_interests.is_empty());
        assert!(member.professional_career.is_empty());
        assert!(member.education.is_empty());
        assert!(member.email.is_empty());
        assert!(page.image_url.is_none());
    }

    #[test]
    fn test_parse_tools_from_fixture() {
        let html = fs::read_to_string("fixtures/homepage").expect("Failed to read fixture");

        let (tools, dropped) = parse_tools(&html);

        assert_eq!(tools.len(), 2);
        assert_eq!(dropped, 1, "The nameless resource should be dropped");

        let omnipath = &tools[0].tool;
        assert_eq!(omnipath.name, "OmniPath");
        assert_eq!(
            omnipath.short_description,
            "Database of molecular biology prior knowledge."
        );
        assert!(omnipath.long_description.starts_with("OmniPath combines"));
        assert_eq!(omnipath.code_repository, "https://github.com/saezlab/pypath");
        assert_eq!(omnipath.website, "https://omnipathdb.org");
        assert_eq!(omnipath.publication, "https://doi.org/10.1038/nmeth.4077");
        assert!(omnipath.categories.database);
        assert!(!omnipath.categories.tool);
        assert!(!omnipath.categories.featured, "Scraping never sets featured");
        assert_eq!(tools[0].image_url.as_deref(), Some("/assets/tools/omnipath.svg"));

        let carnival = &tools[1].tool;
        assert_eq!(carnival.name, "CARNIVAL");
        assert!(carnival.categories.tool);
        assert!(!carnival.categories.database);
    }

    #[test]
    fn test_tool_without_category_marker() {
        let html = r#"
            <div class="resource">
                <h3>Plain</h3>
                <p>Short text.</p>
                <div class="hidden"><p>Long text.</p></div>
            </div>
        "#;

        let (tools, dropped) = parse_tools(html);
        assert_eq!(tools.len(), 1);
        assert_eq!(dropped, 0);
        let categories = tools[0].tool.categories;
        assert!(!categories.featured && !categories.tool && !categories.database);
    }

    #[test]
    fn test_heading_section_finds_wrapped_table() {
        let html = r#"
            <h3>Education</h3>
            <div class="table-wrap">
                <table>
                    <tr><td>2010 - 2014</td><td>BSc</td></tr>
                </table>
            </div>
        "#;

        let page = parse_member_profile(html, "Anyone");
        assert_eq!(page.member.education.len(), 1);
        assert_eq!(page.member.education[0].period, "2010 - 2014");
    }
}
