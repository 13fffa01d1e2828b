use crate::{
    auth::auth::AuthUser,
    db::Store,
    error::{ApiError, ErrorBody},
    model::note::{NewNote, NoteView},
    models::{CreateNoteReq, DeleteReq, MessageResponse, UpdateNoteReq, non_empty},
};
use actix_web::{HttpResponse, web};
use std::collections::HashMap;
use tracing::info;

async fn require_owner(store: &dyn Store, user_id: u64) -> Result<(), ApiError> {
    match store.find_user_by_id(user_id).await? {
        Some(_) => Ok(()),
        None => Err(ApiError::NotFound("User not found".into())),
    }
}

/// List notes
#[utoipa::path(
    get,
    path = "/notes",
    responses(
        (status = 200, description = "Notes visible to the caller, by ticket, with owner usernames", body = [NoteView]),
        (status = 400, description = "No notes found", body = ErrorBody)
    ),
    tag = "Notes",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_notes(
    auth: AuthUser,
    store: web::Data<dyn Store>,
) -> Result<HttpResponse, ApiError> {
    let owner = (!auth.sees_all_notes()).then_some(auth.user_id);
    let notes = store.list_notes(owner).await?;

    if notes.is_empty() {
        return Err(ApiError::NotFound("No notes found".into()));
    }

    let usernames: HashMap<u64, String> = store
        .list_users()
        .await?
        .into_iter()
        .map(|u| (u.id, u.username))
        .collect();

    let notes: Vec<NoteView> = notes
        .into_iter()
        .map(|note| NoteView {
            username: usernames.get(&note.user).cloned(),
            note,
        })
        .collect();

    Ok(HttpResponse::Ok().json(notes))
}

/// Create note
#[utoipa::path(
    post,
    path = "/notes",
    request_body = CreateNoteReq,
    responses(
        (status = 201, description = "Note created", body = MessageResponse, example = json!({
            "message": "New note created"
        })),
        (status = 400, description = "Missing fields or unknown owner", body = ErrorBody),
        (status = 403, description = "Caller may not create notes for that owner", body = ErrorBody),
        (status = 409, description = "Title taken, ignoring case", body = ErrorBody)
    ),
    tag = "Notes",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn create_note(
    auth: AuthUser,
    store: web::Data<dyn Store>,
    body: web::Json<CreateNoteReq>,
) -> Result<HttpResponse, ApiError> {
    let CreateNoteReq { user, title, text } = body.into_inner();

    let (Some(user), Some(title), Some(text)) = (user, non_empty(title), non_empty(text)) else {
        return Err(ApiError::Validation("All fields are required".into()));
    };

    require_owner(store.get_ref(), user).await?;
    auth.require_note_access(user)?;

    if store.find_note_by_title(&title).await?.is_some() {
        return Err(ApiError::Conflict("Duplicate note title".into()));
    }

    let note = store.insert_note(NewNote { user, title, text }).await?;
    info!(note_id = note.id, ticket = note.ticket, "Note created");

    Ok(HttpResponse::Created().json(MessageResponse::new("New note created")))
}

/// Update note
#[utoipa::path(
    patch,
    path = "/notes",
    request_body = UpdateNoteReq,
    responses(
        (status = 200, description = "Note updated", body = MessageResponse, example = json!({
            "message": "'Printer jam' updated"
        })),
        (status = 400, description = "Missing fields, unknown note or unknown owner", body = ErrorBody),
        (status = 403, description = "Caller may not act on that note", body = ErrorBody),
        (status = 409, description = "Title taken by another note", body = ErrorBody)
    ),
    tag = "Notes",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn update_note(
    auth: AuthUser,
    store: web::Data<dyn Store>,
    body: web::Json<UpdateNoteReq>,
) -> Result<HttpResponse, ApiError> {
    let UpdateNoteReq {
        id,
        user,
        title,
        text,
        completed,
    } = body.into_inner();

    let (Some(id), Some(user), Some(title), Some(text), Some(completed)) =
        (id, user, non_empty(title), non_empty(text), completed)
    else {
        return Err(ApiError::Validation("All fields are required".into()));
    };

    let Some(mut note) = store.find_note_by_id(id).await? else {
        return Err(ApiError::NotFound("Note not found".into()));
    };

    auth.require_note_access(note.user)?;
    if user != note.user {
        require_owner(store.get_ref(), user).await?;
        auth.require_note_access(user)?;
    }

    // Keeping the same title (in any case) is allowed.
    if let Some(duplicate) = store.find_note_by_title(&title).await? {
        if duplicate.id != id {
            return Err(ApiError::Conflict("Duplicate note title".into()));
        }
    }

    note.user = user;
    note.title = title;
    note.text = text;
    note.completed = completed;

    store.update_note(&note).await?;
    info!(note_id = note.id, "Note updated");

    Ok(HttpResponse::Ok().json(MessageResponse::new(format!("'{}' updated", note.title))))
}

/// Delete note
#[utoipa::path(
    delete,
    path = "/notes",
    request_body = DeleteReq,
    responses(
        (status = 200, description = "Note deleted", body = MessageResponse, example = json!({
            "message": "Note 'Printer jam' with ID 1 deleted"
        })),
        (status = 400, description = "Missing id or unknown note", body = ErrorBody),
        (status = 403, description = "Caller may not act on that note", body = ErrorBody)
    ),
    tag = "Notes",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn delete_note(
    auth: AuthUser,
    store: web::Data<dyn Store>,
    body: web::Json<DeleteReq>,
) -> Result<HttpResponse, ApiError> {
    let Some(id) = body.id else {
        return Err(ApiError::Validation("Note ID required".into()));
    };

    let Some(note) = store.find_note_by_id(id).await? else {
        return Err(ApiError::NotFound("Note not found".into()));
    };

    auth.require_note_access(note.user)?;

    if !store.delete_note(id).await? {
        return Err(ApiError::NotFound("Note not found".into()));
    }

    info!(note_id = id, "Note deleted");

    Ok(HttpResponse::Ok().json(MessageResponse::new(format!(
        "Note '{}' with ID {} deleted",
        note.title, note.id
    ))))
}

#[cfg(test)]
mod tests {
    use crate::app::build_app;
    use crate::db::Store;
    use crate::model::{
        note::{NewNote, Note},
        role::Role,
        user::User,
    };
    use crate::test_utils::{TestContext, body_json};
    use actix_web::{http::StatusCode, test};
    use serde_json::{Value, json};

    async fn send(ctx: &TestContext, caller: &User, req: test::TestRequest) -> (StatusCode, Value) {
        let app = test::init_service(build_app(ctx.state())).await;
        let req = req.insert_header(ctx.auth_header(caller)).to_request();
        let resp = test::call_service(&app, req).await;
        (resp.status(), body_json(resp).await)
    }

    async fn note_for(ctx: &TestContext, owner: &User, title: &str) -> Note {
        ctx.store
            .insert_note(NewNote {
                user: owner.id,
                title: title.to_string(),
                text: "details".to_string(),
            })
            .await
            .unwrap()
    }

    #[actix_web::test]
    async fn create_assigns_consecutive_tickets() {
        let ctx = TestContext::new();
        let dave = ctx.seed_user("Dave", "x", Role::defaults()).await;

        for title in ["First", "Second"] {
            let (status, body) = send(
                &ctx,
                &dave,
                test::TestRequest::post()
                    .uri("/notes")
                    .set_json(json!({"user": dave.id, "title": title, "text": "t"})),
            )
            .await;
            assert_eq!(status, StatusCode::CREATED);
            assert_eq!(body["message"], "New note created");
        }

        let notes = ctx.store.list_notes(None).await.unwrap();
        let tickets: Vec<u64> = notes.iter().map(|n| n.ticket).collect();
        assert_eq!(tickets, vec![500, 501]);
        assert!(notes.iter().all(|n| !n.completed));
    }

    #[actix_web::test]
    async fn create_validates_fields_owner_and_title() {
        let ctx = TestContext::new();
        let dave = ctx.seed_user("Dave", "x", Role::defaults()).await;
        note_for(&ctx, &dave, "Printer jam").await;

        let (status, body) = send(
            &ctx,
            &dave,
            test::TestRequest::post()
                .uri("/notes")
                .set_json(json!({"user": dave.id, "title": "", "text": "t"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "All fields are required");

        let (status, body) = send(
            &ctx,
            &dave,
            test::TestRequest::post()
                .uri("/notes")
                .set_json(json!({"user": 999, "title": "New", "text": "t"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "User not found");

        let (status, body) = send(
            &ctx,
            &dave,
            test::TestRequest::post()
                .uri("/notes")
                .set_json(json!({"user": dave.id, "title": "PRINTER JAM", "text": "t"})),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["message"], "Duplicate note title");

        assert_eq!(ctx.store.list_notes(None).await.unwrap().len(), 1);
    }

    #[actix_web::test]
    async fn employees_cannot_create_notes_for_others() {
        let ctx = TestContext::new();
        let dave = ctx.seed_user("Dave", "x", Role::defaults()).await;
        let mia = ctx.seed_user("Mia", "x", Role::defaults()).await;

        let (status, _) = send(
            &ctx,
            &dave,
            test::TestRequest::post()
                .uri("/notes")
                .set_json(json!({"user": mia.id, "title": "Hers", "text": "t"})),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[actix_web::test]
    async fn list_is_scoped_to_the_caller_unless_manager() {
        let ctx = TestContext::new();
        let dave = ctx.seed_user("Dave", "x", Role::defaults()).await;
        let mia = ctx.seed_user("Mia", "x", Role::defaults()).await;
        let boss = ctx.seed_user("Boss", "x", vec![Role::Manager]).await;
        note_for(&ctx, &dave, "Dave's").await;
        note_for(&ctx, &mia, "Mia's").await;

        let (status, body) = send(&ctx, &dave, test::TestRequest::get().uri("/notes")).await;
        assert_eq!(status, StatusCode::OK);
        let notes = body.as_array().unwrap();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0]["title"], "Dave's");
        assert_eq!(notes[0]["username"], "Dave");
        assert_eq!(notes[0]["ticket"], 500);

        let (status, body) = send(&ctx, &boss, test::TestRequest::get().uri("/notes")).await;
        assert_eq!(status, StatusCode::OK);
        let usernames: Vec<&str> = body
            .as_array()
            .unwrap()
            .iter()
            .map(|n| n["username"].as_str().unwrap())
            .collect();
        assert_eq!(usernames, vec!["Dave", "Mia"]);
    }

    #[actix_web::test]
    async fn empty_list_is_reported() {
        let ctx = TestContext::new();
        let dave = ctx.seed_user("Dave", "x", Role::defaults()).await;

        let (status, body) = send(&ctx, &dave, test::TestRequest::get().uri("/notes")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "No notes found");
    }

    #[actix_web::test]
    async fn update_replaces_mutable_fields() {
        let ctx = TestContext::new();
        let dave = ctx.seed_user("Dave", "x", Role::defaults()).await;
        let note = note_for(&ctx, &dave, "Printer jam").await;

        let (status, body) = send(
            &ctx,
            &dave,
            test::TestRequest::patch().uri("/notes").set_json(json!({
                "id": note.id,
                "user": dave.id,
                "title": "printer jam",
                "text": "fixed by replacing the roller",
                "completed": true
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "'printer jam' updated");

        let stored = ctx.store.find_note_by_id(note.id).await.unwrap().unwrap();
        assert!(stored.completed);
        assert_eq!(stored.text, "fixed by replacing the roller");
        assert_eq!(stored.ticket, note.ticket);
    }

    #[actix_web::test]
    async fn update_validates_and_guards() {
        let ctx = TestContext::new();
        let dave = ctx.seed_user("Dave", "x", Role::defaults()).await;
        let mia = ctx.seed_user("Mia", "x", Role::defaults()).await;
        let daves = note_for(&ctx, &dave, "Dave's").await;
        let mias = note_for(&ctx, &mia, "Mia's").await;

        let patch = |id: u64, title: &str, completed: Value| {
            test::TestRequest::patch().uri("/notes").set_json(json!({
                "id": id,
                "user": dave.id,
                "title": title,
                "text": "t",
                "completed": completed
            }))
        };

        let (status, body) = send(&ctx, &dave, patch(daves.id, "x", Value::Null)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "All fields are required");

        let (status, body) = send(&ctx, &dave, patch(999, "x", json!(false))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Note not found");

        let (status, _) = send(&ctx, &dave, patch(mias.id, "x", json!(false))).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, body) = send(&ctx, &dave, patch(daves.id, "MIA'S", json!(false))).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["message"], "Duplicate note title");
    }

    #[actix_web::test]
    async fn managers_can_reassign_notes() {
        let ctx = TestContext::new();
        let dave = ctx.seed_user("Dave", "x", Role::defaults()).await;
        let mia = ctx.seed_user("Mia", "x", Role::defaults()).await;
        let boss = ctx.seed_user("Boss", "x", vec![Role::Manager]).await;
        let note = note_for(&ctx, &dave, "Handover").await;

        let (status, _) = send(
            &ctx,
            &boss,
            test::TestRequest::patch().uri("/notes").set_json(json!({
                "id": note.id,
                "user": mia.id,
                "title": "Handover",
                "text": "t",
                "completed": false
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let stored = ctx.store.find_note_by_id(note.id).await.unwrap().unwrap();
        assert_eq!(stored.user, mia.id);
        assert!(ctx.store.user_has_notes(mia.id).await.unwrap());
        assert!(!ctx.store.user_has_notes(dave.id).await.unwrap());
    }

    #[actix_web::test]
    async fn delete_removes_note_and_frees_its_owner() {
        let ctx = TestContext::new();
        let dave = ctx.seed_user("Dave", "x", Role::defaults()).await;
        let note = note_for(&ctx, &dave, "Printer jam").await;

        let (status, body) = send(
            &ctx,
            &dave,
            test::TestRequest::delete().uri("/notes").set_json(json!({"id": note.id})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body["message"],
            format!("Note 'Printer jam' with ID {} deleted", note.id)
        );
        assert!(!ctx.store.user_has_notes(dave.id).await.unwrap());

        let (status, body) = send(
            &ctx,
            &dave,
            test::TestRequest::delete().uri("/notes").set_json(json!({"id": note.id})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Note not found");

        let (status, body) = send(
            &ctx,
            &dave,
            test::TestRequest::delete().uri("/notes").set_json(json!({})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Note ID required");
    }

    #[actix_web::test]
    async fn employees_cannot_delete_others_notes() {
        let ctx = TestContext::new();
        let dave = ctx.seed_user("Dave", "x", Role::defaults()).await;
        let mia = ctx.seed_user("Mia", "x", Role::defaults()).await;
        let note = note_for(&ctx, &mia, "Mia's").await;

        let (status, body) = send(
            &ctx,
            &dave,
            test::TestRequest::delete().uri("/notes").set_json(json!({"id": note.id})),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["message"], "Forbidden");
        assert!(ctx.store.find_note_by_id(note.id).await.unwrap().is_some());
    }

    #[actix_web::test]
    async fn notes_routes_require_a_bearer() {
        let ctx = TestContext::new();
        let app = test::init_service(build_app(ctx.state())).await;

        let req = test::TestRequest::get().uri("/notes").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }
}
