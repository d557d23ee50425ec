use sheetdesk::db::Database;
use sheetdesk::error::Error;
use sheetdesk::models::*;
use sheetdesk::workflow::{Action, WorkflowError};
use speculate2::speculate;
use uuid::Uuid;

fn create_sub_category(db: &Database) -> SubCategory {
    let category = db
        .create_category(CreateCategoryInput {
            title: "Networking".to_string(),
        })
        .expect("Failed to create category");
    db.create_sub_category(
        category.id,
        CreateSubCategoryInput {
            title: "Routers".to_string(),
        },
    )
    .expect("Failed to create sub-category")
}

fn headers(titles: &[&str]) -> Vec<HeaderInput> {
    titles
        .iter()
        .map(|title| HeaderInput {
            title: title.to_string(),
            sections: vec![SectionInput {
                content: format!("About {title}"),
            }],
        })
        .collect()
}

fn create_sheet(db: &Database, sub_category_id: Uuid, title: &str) -> Sheet {
    db.create_sheet(
        sub_category_id,
        CreateSheetInput {
            title: title.to_string(),
            headers: headers(&["Setup"]),
            submit: true,
        },
    )
    .expect("Failed to create sheet")
    .sheet
    .sheet
}

fn create_published_sheet(db: &Database, sub_category_id: Uuid, title: &str) -> Sheet {
    let sheet = create_sheet(db, sub_category_id, title);
    db.publish_sheet(sheet.id)
        .expect("Failed to publish sheet")
        .sheet
        .sheet
}

fn edit_input(title: &str, header_titles: &[&str]) -> EditSheetInput {
    EditSheetInput {
        title: title.to_string(),
        headers: headers(header_titles),
    }
}

fn correction() -> CreateCommentInput {
    CreateCommentInput {
        author: "Reviewer".to_string(),
        content: "Please add the firmware version".to_string(),
    }
}

fn status_of(db: &Database, id: Uuid) -> Option<SheetStatus> {
    db.get_sheet(id).expect("Failed to load sheet").map(|s| s.status)
}

/// Published sheets never carry an origin link.
fn assert_published_have_no_origin(db: &Database, sub_category_id: Uuid) {
    let sheets = db
        .get_sheets_by_sub_category(sub_category_id)
        .expect("Failed to list sheets");
    for sheet in sheets {
        if sheet.status == SheetStatus::Published {
            assert!(
                sheet.origin_id.is_none(),
                "published sheet {} has an origin",
                sheet.id
            );
        }
    }
}

speculate! {
    before {
        let db = Database::open_memory().expect("Failed to create in-memory database");
        db.migrate().expect("Failed to run migrations");
        let sub = create_sub_category(&db);
    }

    describe "create_sheet" {
        it "submits a new sheet for review with front unset" {
            let outcome = db.create_sheet(sub.id, CreateSheetInput {
                title: "Reset a router".to_string(),
                headers: headers(&["Before you start", "Steps"]),
                submit: true,
            }).expect("Failed to create sheet");

            let sheet = &outcome.sheet.sheet;
            assert_eq!(sheet.status, SheetStatus::ToValidate);
            assert!(!sheet.front);
            assert!(sheet.origin_id.is_none());
            assert_eq!(sheet.slug, "reset-a-router");
            assert_eq!(outcome.sheet.headers.len(), 2);
            assert_eq!(outcome.sheet.headers[1].title, "Steps");
            assert_eq!(outcome.sheet.headers[0].sections[0].content, "About Before you start");
            assert!(!outcome.message.is_empty());
        }

        it "saves a draft when not submitted" {
            let outcome = db.create_sheet(sub.id, CreateSheetInput {
                title: "Draft".to_string(),
                headers: vec![],
                submit: false,
            }).expect("Failed to create sheet");

            assert_eq!(outcome.sheet.sheet.status, SheetStatus::Draft);
        }

        it "gives sheets with the same title distinct slugs" {
            let first = create_sheet(&db, sub.id, "Firmware");
            let second = create_sheet(&db, sub.id, "Firmware");

            assert_eq!(first.slug, "firmware");
            assert_eq!(second.slug, "firmware-2");
        }

        it "rejects an empty title without storing anything" {
            let result = db.create_sheet(sub.id, CreateSheetInput {
                title: "  ".to_string(),
                headers: vec![],
                submit: true,
            });

            assert!(matches!(result, Err(Error::Validation(_))));
            assert!(db.get_sheets_by_sub_category(sub.id).unwrap().is_empty());
        }

        it "fails for an unknown sub-category" {
            let result = db.create_sheet(Uuid::new_v4(), CreateSheetInput {
                title: "Orphan".to_string(),
                headers: vec![],
                submit: true,
            });

            assert!(matches!(result, Err(Error::NotFound(_))));
        }
    }

    describe "edit_sheet" {
        it "updates a pending sheet in place" {
            let sheet = create_sheet(&db, sub.id, "Reset a router");

            let outcome = db.edit_sheet(sheet.id, edit_input("Reset a router", &["Steps", "Checks"]))
                .expect("Failed to edit sheet");

            assert!(!outcome.forked);
            assert_eq!(outcome.sheet.sheet.id, sheet.id);
            assert_eq!(outcome.sheet.sheet.status, SheetStatus::ToValidate);
            assert_eq!(outcome.sheet.headers.len(), 2);
            assert_eq!(db.get_sheets_by_sub_category(sub.id).unwrap().len(), 1);
        }

        it "flips a sheet to correct back to validation" {
            let sheet = create_sheet(&db, sub.id, "Reset a router");
            db.request_correction(sheet.id, correction()).expect("Failed to request correction");

            let outcome = db.edit_sheet(sheet.id, edit_input("Reset a router", &["Steps"]))
                .expect("Failed to edit sheet");

            assert!(!outcome.forked);
            assert_eq!(outcome.sheet.sheet.status, SheetStatus::ToValidate);
            assert_eq!(db.get_sheets_by_sub_category(sub.id).unwrap().len(), 1);
        }

        it "keeps the slug when the title is unchanged" {
            let sheet = create_sheet(&db, sub.id, "Reset a router");

            let outcome = db.edit_sheet(sheet.id, edit_input("Reset a router", &[]))
                .expect("Failed to edit sheet");

            assert_eq!(outcome.sheet.sheet.slug, "reset-a-router");
        }

        it "re-slugs a renamed sheet" {
            let sheet = create_sheet(&db, sub.id, "Reset a router");

            let outcome = db.edit_sheet(sheet.id, edit_input("Factory reset", &[]))
                .expect("Failed to edit sheet");

            assert_eq!(outcome.sheet.sheet.title, "Factory reset");
            assert_eq!(outcome.sheet.sheet.slug, "factory-reset");
        }

        it "forks a published sheet and leaves it untouched" {
            let published = create_published_sheet(&db, sub.id, "Reset a router");
            let original = db.get_sheet_detail(published.id).unwrap().unwrap();

            let outcome = db.edit_sheet(published.id, edit_input("Reset a router (v2)", &["New steps"]))
                .expect("Failed to edit sheet");

            assert!(outcome.forked);
            let revision = &outcome.sheet.sheet;
            assert_ne!(revision.id, published.id);
            assert_eq!(revision.status, SheetStatus::ToValidate);
            assert_eq!(revision.origin_id, Some(published.id));
            assert!(!revision.front);
            assert_eq!(outcome.sheet.headers[0].title, "New steps");

            let current = db.get_sheet_detail(published.id).unwrap().unwrap();
            assert_eq!(current.sheet.title, original.sheet.title);
            assert_eq!(current.sheet.status, SheetStatus::Published);
            assert_eq!(current.headers.len(), original.headers.len());
            assert_eq!(current.headers[0].title, "Setup");

            assert_eq!(db.get_sheets_by_sub_category(sub.id).unwrap().len(), 2);
            assert_eq!(db.get_pending_revision(published.id).unwrap().map(|s| s.id), Some(revision.id));
            assert_published_have_no_origin(&db, sub.id);
        }

        it "copies the attachments of the published sheet into the fork" {
            let published = create_published_sheet(&db, sub.id, "Reset a router");
            db.edit_attachments(published.id, EditAttachmentsInput {
                attachments: vec![AttachmentInput {
                    label: "Manual".to_string(),
                    url: "https://example.com/manual.pdf".to_string(),
                }],
            }).expect("Failed to edit attachments");

            let outcome = db.edit_sheet(published.id, edit_input("Reset a router", &[]))
                .expect("Failed to edit sheet");

            assert_eq!(outcome.sheet.attachments.len(), 1);
            assert_eq!(outcome.sheet.attachments[0].label, "Manual");
            assert_eq!(outcome.sheet.attachments[0].sheet_id, outcome.sheet.sheet.id);
        }

        it "rejects a second fork of the same published sheet" {
            let published = create_published_sheet(&db, sub.id, "Reset a router");
            db.edit_sheet(published.id, edit_input("First change", &[]))
                .expect("Failed to edit sheet");

            let result = db.edit_sheet(published.id, edit_input("Second change", &[]));

            assert!(matches!(result, Err(Error::IntegrityConflict(_))));
            assert_eq!(db.get_sheets_by_sub_category(sub.id).unwrap().len(), 2);
        }

        it "rejects invalid content without touching the sheet" {
            let sheet = create_sheet(&db, sub.id, "Reset a router");

            let result = db.edit_sheet(sheet.id, edit_input("Reset a router", &[""]));

            assert!(matches!(result, Err(Error::Validation(_))));
            let stored = db.get_sheet_detail(sheet.id).unwrap().unwrap();
            assert_eq!(stored.headers[0].title, "Setup");
        }

        it "returns not found for an unknown sheet" {
            let result = db.edit_sheet(Uuid::new_v4(), edit_input("Anything", &[]));
            assert!(matches!(result, Err(Error::NotFound(_))));
        }
    }

    describe "request_correction" {
        it "stores the comment and sends the sheet back" {
            let sheet = create_sheet(&db, sub.id, "Reset a router");

            let outcome = db.request_correction(sheet.id, correction())
                .expect("Failed to request correction");

            assert_eq!(outcome.sheet.status, SheetStatus::ToCorrect);
            assert_eq!(outcome.comment.sheet_id, sheet.id);
            assert_eq!(status_of(&db, sheet.id), Some(SheetStatus::ToCorrect));

            let comments = db.get_sheet_comments(sheet.id).unwrap();
            assert_eq!(comments.len(), 1);
            assert_eq!(comments[0].author, "Reviewer");
        }

        it "is refused for a published sheet and stores nothing" {
            let published = create_published_sheet(&db, sub.id, "Reset a router");

            let result = db.request_correction(published.id, correction());

            assert!(matches!(
                result,
                Err(Error::Workflow(WorkflowError::InvalidTransition {
                    from: SheetStatus::Published,
                    action: Action::RequestCorrection,
                }))
            ));
            assert!(db.get_sheet_comments(published.id).unwrap().is_empty());
            assert_eq!(status_of(&db, published.id), Some(SheetStatus::Published));
        }

        it "is refused for a sheet already sent back" {
            let sheet = create_sheet(&db, sub.id, "Reset a router");
            db.request_correction(sheet.id, correction()).unwrap();

            let result = db.request_correction(sheet.id, correction());

            assert!(matches!(result, Err(Error::Workflow(_))));
            assert_eq!(db.get_sheet_comments(sheet.id).unwrap().len(), 1);
        }

        it "rejects an empty comment" {
            let sheet = create_sheet(&db, sub.id, "Reset a router");

            let result = db.request_correction(sheet.id, CreateCommentInput {
                author: "Reviewer".to_string(),
                content: String::new(),
            });

            assert!(matches!(result, Err(Error::Validation(_))));
            assert_eq!(status_of(&db, sheet.id), Some(SheetStatus::ToValidate));
        }
    }

    describe "submit_sheet" {
        it "sends a draft to review" {
            let draft = db.create_sheet(sub.id, CreateSheetInput {
                title: "Draft".to_string(),
                headers: vec![],
                submit: false,
            }).unwrap().sheet.sheet;

            let outcome = db.submit_sheet(draft.id).expect("Failed to submit");

            assert_eq!(outcome.sheet.sheet.status, SheetStatus::ToValidate);
        }

        it "is refused for a sheet already under review" {
            let sheet = create_sheet(&db, sub.id, "Reset a router");
            let result = db.submit_sheet(sheet.id);
            assert!(matches!(result, Err(Error::Workflow(_))));
        }
    }

    describe "publish_sheet" {
        it "publishes a new sheet awaiting validation" {
            let sheet = create_sheet(&db, sub.id, "Reset a router");

            let outcome = db.publish_sheet(sheet.id).expect("Failed to publish");

            assert_eq!(outcome.sheet.sheet.status, SheetStatus::Published);
            assert_published_have_no_origin(&db, sub.id);
        }

        it "refuses to promote a revision over its origin" {
            let published = create_published_sheet(&db, sub.id, "Reset a router");
            let revision = db.edit_sheet(published.id, edit_input("Reset a router", &[]))
                .unwrap().sheet.sheet;

            let result = db.publish_sheet(revision.id);

            assert!(matches!(
                result,
                Err(Error::Workflow(WorkflowError::PromotionUnsupported))
            ));
            assert_eq!(status_of(&db, revision.id), Some(SheetStatus::ToValidate));
            assert_eq!(status_of(&db, published.id), Some(SheetStatus::Published));
            assert_published_have_no_origin(&db, sub.id);
        }

        it "is refused for a sheet to correct" {
            let sheet = create_sheet(&db, sub.id, "Reset a router");
            db.request_correction(sheet.id, correction()).unwrap();

            assert!(matches!(db.publish_sheet(sheet.id), Err(Error::Workflow(_))));
        }
    }

    describe "set_front" {
        it "features a sheet in any state without changing its status" {
            let pending = create_sheet(&db, sub.id, "Pending");
            let published = create_published_sheet(&db, sub.id, "Published");

            let pending = db.set_front(pending.id).unwrap().sheet.sheet;
            let published = db.set_front(published.id).unwrap().sheet.sheet;

            assert!(pending.front);
            assert_eq!(pending.status, SheetStatus::ToValidate);
            assert!(published.front);
            assert_eq!(published.status, SheetStatus::Published);
        }

        it "lists featured sheets first" {
            create_sheet(&db, sub.id, "Alpha");
            let zulu = create_sheet(&db, sub.id, "Zulu");
            db.set_front(zulu.id).unwrap();

            let sheets = db.get_sheets_by_sub_category(sub.id).unwrap();
            assert_eq!(sheets[0].title, "Zulu");
            assert_eq!(sheets[1].title, "Alpha");
        }
    }

    describe "edit_attachments" {
        it "replaces attachments without touching status or content" {
            let published = create_published_sheet(&db, sub.id, "Reset a router");

            let outcome = db.edit_attachments(published.id, EditAttachmentsInput {
                attachments: vec![
                    AttachmentInput { label: "Manual".to_string(), url: "/files/manual.pdf".to_string() },
                    AttachmentInput { label: "Driver".to_string(), url: "/files/driver.zip".to_string() },
                ],
            }).expect("Failed to edit attachments");

            assert_eq!(outcome.sheet.sheet.status, SheetStatus::Published);
            assert_eq!(outcome.sheet.attachments.len(), 2);
            assert_eq!(outcome.sheet.attachments[1].position, 1);
            assert_eq!(outcome.sheet.headers[0].title, "Setup");
            assert!(db.get_pending_revision(published.id).unwrap().is_none());
        }

        it "rejects an attachment without url" {
            let sheet = create_sheet(&db, sub.id, "Reset a router");

            let result = db.edit_attachments(sheet.id, EditAttachmentsInput {
                attachments: vec![AttachmentInput { label: "Manual".to_string(), url: String::new() }],
            });

            assert!(matches!(result, Err(Error::Validation(_))));
        }
    }

    describe "delete_sheet" {
        it "removes a pending sheet" {
            let sheet = create_sheet(&db, sub.id, "Reset a router");

            let outcome = db.delete_sheet(sheet.id).expect("Failed to delete");

            assert_eq!(outcome.deleted, vec![sheet.id]);
            assert!(db.get_sheet(sheet.id).unwrap().is_none());
        }

        it "removes a revision and leaves its origin published" {
            let published = create_published_sheet(&db, sub.id, "Reset a router");
            let revision = db.edit_sheet(published.id, edit_input("Reset a router", &[]))
                .unwrap().sheet.sheet;

            let outcome = db.delete_sheet(revision.id).expect("Failed to delete");

            assert_eq!(outcome.deleted, vec![revision.id]);
            assert_eq!(status_of(&db, published.id), Some(SheetStatus::Published));
            assert!(db.get_pending_revision(published.id).unwrap().is_none());
        }

        it "removes a published sheet together with its revision" {
            let published = create_published_sheet(&db, sub.id, "Reset a router");
            let revision = db.edit_sheet(published.id, edit_input("Reset a router", &[]))
                .unwrap().sheet.sheet;

            let outcome = db.delete_sheet(published.id).expect("Failed to delete");

            assert_eq!(outcome.deleted, vec![revision.id, published.id]);
            assert!(db.get_sheets_by_sub_category(sub.id).unwrap().is_empty());
        }

        it "removes only a published sheet without revision" {
            let published = create_published_sheet(&db, sub.id, "Reset a router");
            let other = create_sheet(&db, sub.id, "Unrelated");

            let outcome = db.delete_sheet(published.id).expect("Failed to delete");

            assert_eq!(outcome.deleted, vec![published.id]);
            assert!(db.get_sheet(other.id).unwrap().is_some());
        }

        it "removes the comments of a deleted sheet" {
            let sheet = create_sheet(&db, sub.id, "Reset a router");
            let comment = db.request_correction(sheet.id, correction()).unwrap().comment;

            db.delete_sheet(sheet.id).expect("Failed to delete");

            assert!(db.get_comment(comment.id).unwrap().is_none());
        }

        it "removes a draft" {
            let draft = db.create_sheet(sub.id, CreateSheetInput {
                title: "Draft".to_string(),
                headers: vec![],
                submit: false,
            }).unwrap().sheet.sheet;

            let outcome = db.delete_sheet(draft.id).expect("Failed to delete");
            assert_eq!(outcome.deleted, vec![draft.id]);
        }

        it "returns not found for an unknown sheet" {
            assert!(matches!(db.delete_sheet(Uuid::new_v4()), Err(Error::NotFound(_))));
        }
    }

    describe "revision lifecycle" {
        it "forks, corrects, re-edits and deletes with cascade" {
            let a = create_published_sheet(&db, sub.id, "Reset a router");

            // A is edited: B is forked from it
            let b = db.edit_sheet(a.id, edit_input("Reset a router", &["Updated"]))
                .unwrap().sheet.sheet;
            assert_eq!(b.origin_id, Some(a.id));
            assert_eq!(b.status, SheetStatus::ToValidate);
            assert_eq!(status_of(&db, a.id), Some(SheetStatus::Published));
            assert_published_have_no_origin(&db, sub.id);

            // Reviewer comments on B
            let corrected = db.request_correction(b.id, correction()).unwrap().sheet;
            assert_eq!(corrected.id, b.id);
            assert_eq!(corrected.status, SheetStatus::ToCorrect);
            assert_published_have_no_origin(&db, sub.id);

            // Author edits B again: same entity, back to validation
            let outcome = db.edit_sheet(b.id, edit_input("Reset a router", &["Fixed"])).unwrap();
            assert!(!outcome.forked);
            assert_eq!(outcome.sheet.sheet.id, b.id);
            assert_eq!(outcome.sheet.sheet.status, SheetStatus::ToValidate);
            assert_eq!(outcome.sheet.sheet.origin_id, Some(a.id));
            assert_eq!(db.get_sheets_by_sub_category(sub.id).unwrap().len(), 2);
            assert_published_have_no_origin(&db, sub.id);

            // Admin deletes A: B goes first, then A
            let deleted = db.delete_sheet(a.id).unwrap().deleted;
            assert_eq!(deleted, vec![b.id, a.id]);
            assert!(db.get_sheet(a.id).unwrap().is_none());
            assert!(db.get_sheet(b.id).unwrap().is_none());
            assert!(db.get_sheet_comments(b.id).unwrap().is_empty());
        }

        it "allows a new fork once the previous revision is deleted" {
            let a = create_published_sheet(&db, sub.id, "Reset a router");
            let b = db.edit_sheet(a.id, edit_input("Reset a router", &[])).unwrap().sheet.sheet;
            db.delete_sheet(b.id).unwrap();

            let outcome = db.edit_sheet(a.id, edit_input("Reset a router", &[])).unwrap();

            assert!(outcome.forked);
            assert_eq!(outcome.sheet.sheet.origin_id, Some(a.id));
        }
    }

    describe "show by slugs" {
        it "finds a sheet from its public address" {
            let sheet = create_sheet(&db, sub.id, "Reset a router");

            let found = db.get_sheet_by_slugs("networking", "routers", "reset-a-router")
                .unwrap()
                .expect("sheet should be found");

            assert_eq!(found.sheet.id, sheet.id);
            assert_eq!(found.headers.len(), 1);
        }

        it "returns None for an unknown address" {
            assert!(db.get_sheet_by_slugs("networking", "switches", "reset-a-router").unwrap().is_none());
            assert!(db.get_sheet_by_slugs("networking", "routers", "missing").unwrap().is_none());
        }
    }
}
