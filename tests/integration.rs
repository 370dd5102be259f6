//! Integration tests for the skid labeler library
//!
//! Fixtures are synthetic manifest PDFs built with lopdf: each page places
//! its identifying fields at the fixed region coordinates the labeler reads.

use std::fs;
use std::path::{Path, PathBuf};

use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};
use tempfile::TempDir;

use skid_labeler::pdf::{label_document, LabelOptions};
use skid_labeler::report::{NullReporter, ReportEvent, Reporter};
use skid_labeler::watch::{watch_folder, WatchOptions};
use skid_labeler::Error;

/// One positioned text span on a fixture page
type Span = (f32, f32, String);

/// The header fields every valid fixture page carries
fn header(dock: &str, order: &str) -> Vec<Span> {
    vec![
        (50.0, 740.0, dock.to_string()),
        (400.0, 740.0, order.to_string()),
    ]
}

/// Build a manifest PDF with one content stream per page
fn build_manifest(pages: &[Vec<Span>]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id: ObjectId = doc.new_object_id();

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });

    let mut kids: Vec<Object> = Vec::new();
    for spans in pages {
        let mut content = String::new();
        for (x, y, text) in spans {
            content.push_str(&format!("BT /F1 12 Tf {} {} Td ({}) Tj ET\n", x, y, text));
        }
        let content_id = doc.add_object(Object::Stream(Stream::new(
            Dictionary::new(),
            content.into_bytes(),
        )));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            "Contents" => content_id,
            "Resources" => Object::Dictionary(dictionary! {
                "Font" => Object::Dictionary(dictionary! { "F1" => font_id }),
            }),
        });
        kids.push(page_id.into());
    }

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => pages.len() as i64,
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buf = Vec::new();
    doc.save_to(&mut buf).expect("failed to save fixture PDF");
    buf
}

fn write_manifest(dir: &Path, name: &str, pages: &[Vec<Span>]) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, build_manifest(pages)).expect("failed to write fixture");
    path
}

/// The /SkidLabel XObject content of a labeled page, or None when the page
/// was passed through unstamped
fn stamp_content(doc: &Document, page_id: ObjectId) -> Option<String> {
    let page = doc.get_object(page_id).ok()?.as_dict().ok()?;
    let resources = match page.get(b"Resources").ok()? {
        Object::Dictionary(d) => d.clone(),
        Object::Reference(id) => doc.get_object(*id).ok()?.as_dict().ok()?.clone(),
        _ => return None,
    };
    let xobjects = match resources.get(b"XObject").ok()? {
        Object::Dictionary(d) => d.clone(),
        Object::Reference(id) => doc.get_object(*id).ok()?.as_dict().ok()?.clone(),
        _ => return None,
    };
    let stamp_id = match xobjects.get(b"SkidLabel").ok()? {
        Object::Reference(id) => *id,
        _ => return None,
    };
    let stream = doc.get_object(stamp_id).ok()?.as_stream().ok()?;
    Some(String::from_utf8_lossy(&stream.content).into_owned())
}

/// Per page: (skid stamp text, mark-one present) from the labeled output
fn stamps(path: &Path) -> Vec<Option<(String, bool)>> {
    let mut doc = Document::load(path).expect("failed to load labeled output");
    doc.decompress();
    let page_ids: Vec<ObjectId> = doc.get_pages().values().copied().collect();
    page_ids
        .iter()
        .map(|id| {
            stamp_content(&doc, *id).map(|content| {
                let skid = content
                    .lines()
                    .find_map(|line| {
                        line.strip_suffix(") Tj")
                            .and_then(|rest| rest.strip_prefix('('))
                            .filter(|text| text.contains("of"))
                            .map(str::to_string)
                    })
                    .unwrap_or_default();
                let marked = content.contains("(1) Tj");
                (skid, marked)
            })
        })
        .collect()
}

fn label_into(dir: &TempDir, input: &Path) -> skid_labeler::Result<(PathBuf, skid_labeler::pdf::LabelStats)> {
    let output = dir.path().join("out").join(input.file_name().unwrap());
    fs::create_dir_all(output.parent().unwrap()).unwrap();
    label_document(input, &output, &LabelOptions::default(), &NullReporter)
        .map(|stats| (output, stats))
}

#[test]
fn test_scenario_a_grouping_and_numbering() {
    let dir = TempDir::new().unwrap();
    let input = write_manifest(
        dir.path(),
        "a.pdf",
        &[
            header("P1", "2025062601"),
            header("P1", "2025062601"),
            header("P1", "2025062602"),
        ],
    );

    let (output, stats) = label_into(&dir, &input).unwrap();
    assert_eq!(stats.pages, 3);
    assert_eq!(stats.labeled, 3);
    assert_eq!(stats.groups, 2);
    assert_eq!(stats.rejected, 0);

    let got = stamps(&output);
    // Size-2 group: both pages "1 of 1"; singleton: "1 of 1"
    assert_eq!(got[0].as_ref().unwrap().0, "1 of 1");
    assert_eq!(got[1].as_ref().unwrap().0, "1 of 1");
    assert_eq!(got[2].as_ref().unwrap().0, "1 of 1");
}

#[test]
fn test_even_group_numbers_pairs_in_page_order() {
    let dir = TempDir::new().unwrap();
    let input = write_manifest(
        dir.path(),
        "even.pdf",
        &[
            header("P1", "2025070001"),
            header("P1", "2025070001"),
            header("P1", "2025070001"),
            header("P1", "2025070001"),
        ],
    );

    let (output, _) = label_into(&dir, &input).unwrap();
    let got: Vec<String> = stamps(&output)
        .into_iter()
        .map(|s| s.unwrap().0)
        .collect();
    assert_eq!(got, vec!["1 of 2", "1 of 2", "2 of 2", "2 of 2"]);
}

#[test]
fn test_odd_group_keeps_the_undercount() {
    let dir = TempDir::new().unwrap();
    let pages: Vec<Vec<Span>> = (0..5).map(|_| header("P1", "2025070002")).collect();
    let input = write_manifest(dir.path(), "odd.pdf", &pages);

    let (output, _) = label_into(&dir, &input).unwrap();
    let got: Vec<String> = stamps(&output)
        .into_iter()
        .map(|s| s.unwrap().0)
        .collect();
    // 5 pages -> 2 units; the unpaired last page reads "3 of 2"
    assert_eq!(got, vec!["1 of 2", "1 of 2", "2 of 2", "2 of 2", "3 of 2"]);
}

#[test]
fn test_scenario_b_t8_marks_on_tg83() {
    let dir = TempDir::new().unwrap();
    let mut marked_page = header("T8", "2025062601");
    marked_page.push((50.0, 620.0, "TG83 PACK".to_string()));
    let mut unmarked_page = header("T8", "2025062602");
    unmarked_page.push((50.0, 620.0, "TG80".to_string()));
    let input = write_manifest(dir.path(), "t8.pdf", &[marked_page, unmarked_page]);

    let (output, stats) = label_into(&dir, &input).unwrap();
    assert_eq!(stats.marked, 1);

    let got = stamps(&output);
    assert!(got[0].as_ref().unwrap().1, "TG83 page should carry the mark");
    assert!(!got[1].as_ref().unwrap().1, "TG80 page should not be marked");
}

#[test]
fn test_a3_and_z1_read_the_part_number_region() {
    let dir = TempDir::new().unwrap();
    let mut a3_page = header("A3", "2025062611");
    a3_page.push((250.0, 620.0, "A70L-0001".to_string()));
    let mut z1_page = header("Z1", "2025062612");
    z1_page.push((250.0, 620.0, "Z0011070".to_string()));
    let mut z1_miss = header("Z1", "2025062613");
    z1_miss.push((250.0, 620.0, "A70L-0001".to_string()));
    let input = write_manifest(dir.path(), "a3z1.pdf", &[a3_page, z1_page, z1_miss]);

    let (output, stats) = label_into(&dir, &input).unwrap();
    assert_eq!(stats.marked, 2);

    let got = stamps(&output);
    assert!(got[0].as_ref().unwrap().1);
    assert!(got[1].as_ref().unwrap().1);
    // Z1 ignores the A3 patterns in the shared rectangle
    assert!(!got[2].as_ref().unwrap().1);
}

#[test]
fn test_scenario_c_single_standalone_code_marks() {
    let dir = TempDir::new().unwrap();
    let mut single = header("DOCK9", "2025062621");
    single.push((50.0, 530.0, "PYW5".to_string()));
    let mut double = header("DOCK9", "2025062622");
    double.push((50.0, 530.0, "PYW5".to_string()));
    double.push((50.0, 510.0, "EXTRA".to_string()));
    let input = write_manifest(dir.path(), "other.pdf", &[single, double]);

    let (output, stats) = label_into(&dir, &input).unwrap();
    assert_eq!(stats.marked, 1);

    let got = stamps(&output);
    assert!(got[0].as_ref().unwrap().1, "single PYW5 line should mark");
    assert!(!got[1].as_ref().unwrap().1, "extra line should veto the mark");
}

#[test]
fn test_scenario_d_order_number_is_leftmost_digit_run() {
    let dir = TempDir::new().unwrap();
    let input = write_manifest(
        dir.path(),
        "d.pdf",
        &[
            header("P1", "Order: 2025062605 Rev2"),
            header("P1", "2025062605"),
        ],
    );

    let (output, stats) = label_into(&dir, &input).unwrap();
    // Both pages resolve to order 2025062605 and pair up as one skid
    assert_eq!(stats.groups, 1);
    let got: Vec<String> = stamps(&output)
        .into_iter()
        .map(|s| s.unwrap().0)
        .collect();
    assert_eq!(got, vec!["1 of 1", "1 of 1"]);
}

#[test]
fn test_scenario_e_wholly_invalid_document_is_rejected() {
    let dir = TempDir::new().unwrap();
    // No digits anywhere near the order region, dock region empty
    let input = write_manifest(
        dir.path(),
        "e.pdf",
        &[vec![(300.0, 400.0, "FREE TEXT BODY".to_string())]],
    );

    let output = dir.path().join("out").join("e.pdf");
    fs::create_dir_all(output.parent().unwrap()).unwrap();
    let result = label_document(&input, &output, &LabelOptions::default(), &NullReporter);

    assert!(matches!(result, Err(Error::NoValidPages(_))));
    assert!(!output.exists(), "no output may be produced");
    assert!(input.exists(), "source must be left in place");
}

#[test]
fn test_invalid_page_passes_through_unlabeled() {
    let dir = TempDir::new().unwrap();
    let bad_page = vec![
        (50.0, 740.0, "P1".to_string()),
        (400.0, 740.0, "Rev 123".to_string()), // digit run too short
    ];
    let input = write_manifest(
        dir.path(),
        "mixed.pdf",
        &[
            header("P1", "2025062631"),
            bad_page,
            header("P1", "2025062631"),
        ],
    );

    let (output, stats) = label_into(&dir, &input).unwrap();
    assert_eq!(stats.pages, 3);
    assert_eq!(stats.labeled, 2);
    assert_eq!(stats.rejected, 1);

    let got = stamps(&output);
    assert!(got[0].is_some());
    assert!(got[1].is_none(), "rejected page must pass through unstamped");
    assert!(got[2].is_some());
    // The valid pair still numbers as one skid
    assert_eq!(got[0].as_ref().unwrap().0, "1 of 1");
    assert_eq!(got[2].as_ref().unwrap().0, "1 of 1");
}

#[test]
fn test_relabeling_the_same_records_is_idempotent() {
    let dir = TempDir::new().unwrap();
    let pages = vec![
        header("P1", "2025062641"),
        header("P1", "2025062641"),
        header("T8", "2025062642"),
    ];
    let first_input = write_manifest(dir.path(), "run1.pdf", &pages);
    let second_input = write_manifest(dir.path(), "run2.pdf", &pages);

    let (first_out, first_stats) = label_into(&dir, &first_input).unwrap();
    let (second_out, second_stats) = label_into(&dir, &second_input).unwrap();

    assert_eq!(first_stats.labeled, second_stats.labeled);
    assert_eq!(first_stats.groups, second_stats.groups);
    let first: Vec<String> = stamps(&first_out).into_iter().map(|s| s.unwrap().0).collect();
    let second: Vec<String> = stamps(&second_out).into_iter().map(|s| s.unwrap().0).collect();
    assert_eq!(first, second);
}

#[test]
fn test_reporter_sees_rejections_and_decisions() {
    use std::sync::Mutex;

    #[derive(Default)]
    struct Collecting {
        events: Mutex<Vec<ReportEvent>>,
    }
    impl Reporter for Collecting {
        fn event(&self, event: ReportEvent) {
            self.events.lock().unwrap().push(event);
        }
    }

    let dir = TempDir::new().unwrap();
    let bad_page = vec![(400.0, 740.0, "2025062651".to_string())]; // no dock code
    let input = write_manifest(
        dir.path(),
        "audit.pdf",
        &[header("T8", "2025062651"), bad_page],
    );

    let output = dir.path().join("out.pdf");
    let reporter = Collecting::default();
    label_document(&input, &output, &LabelOptions::default(), &reporter).unwrap();

    let events = reporter.events.lock().unwrap();
    assert!(events
        .iter()
        .any(|e| matches!(e, ReportEvent::PageRejected { page_index: 1, .. })));
    assert!(events
        .iter()
        .any(|e| matches!(e, ReportEvent::MarkDecision { page_index: 0, .. })));
    assert!(events
        .iter()
        .any(|e| matches!(e, ReportEvent::PageLabeled { page_index: 0, .. })));
    assert!(events
        .iter()
        .any(|e| matches!(e, ReportEvent::GroupBuilt { .. })));
}

#[test]
fn test_watch_processes_backlog_and_leaves_rejects() {
    let dir = TempDir::new().unwrap();
    let inbox = dir.path().join("inbox");
    let out_dir = dir.path().join("labeled");
    fs::create_dir_all(&inbox).unwrap();

    let good = write_manifest(&inbox, "good.pdf", &[header("P1", "2025062661")]);
    let bad = write_manifest(
        &inbox,
        "bad.pdf",
        &[vec![(300.0, 400.0, "NOTHING HERE".to_string())]],
    );

    {
        let options = WatchOptions {
            inbox: inbox.clone(),
            out_dir: out_dir.clone(),
            label: LabelOptions::default(),
        };
        std::thread::spawn(move || {
            let _ = watch_folder(&options, &NullReporter);
        });
    }

    // The backlog pass handles both files; poll for the outcome
    let labeled = out_dir.join("good.pdf");
    for _ in 0..100 {
        if labeled.exists() && !good.exists() {
            break;
        }
        std::thread::sleep(std::time::Duration::from_millis(100));
    }

    assert!(labeled.exists(), "good manifest should be labeled");
    assert!(!good.exists(), "processed source should be deleted");
    assert!(bad.exists(), "rejected source must stay in the inbox");
    assert!(!out_dir.join("bad.pdf").exists());
}
