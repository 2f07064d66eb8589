use std::path::Path;
use std::sync::Arc;

use bytes::Bytes;
use narrative::application::admin::posts::{AdminPostService, CoverUpload, PostForm, SavePostCommand};
use narrative::application::admin::settings::AdminSettingsService;
use narrative::application::auth::{AdminSession, AuthService};
use narrative::application::error::AppError;
use narrative::config::{AdminArgs, AdminCommand, PostFormArgs};
use narrative::domain::posts::parse_form_date;
use narrative::infra::{auth::StaticAuthenticator, error::InfraError};
use time::Date;
use tokio::fs;
use uuid::Uuid;

use super::Ctx;
use crate::print;

pub async fn handle(ctx: &Ctx, args: AdminArgs) -> Result<(), AppError> {
    let session = login(ctx, &args.email, &args.password).await?;

    match args.command {
        AdminCommand::List { json } => {
            let service = post_service(ctx)?;
            let page = service.list(&session).await;
            if json {
                print::print_json(&page)
            } else {
                print::admin_list(&page);
                Ok(())
            }
        }
        AdminCommand::Create(form) => {
            let command = SavePostCommand {
                id: None,
                title: form.title.clone().unwrap_or_default(),
                date: parse_date(form.date.as_deref())?,
                content: read_content(&form).await?.unwrap_or_default(),
                published: form.published.unwrap_or(false),
                cover: read_cover(form.cover.as_deref()).await?,
            };
            let record = post_service(ctx)?.save(&session, command).await?;
            println!("Created {} ({})", record.slug, record.id);
            Ok(())
        }
        AdminCommand::Edit { id, form } => edit(ctx, &session, id, form).await,
        AdminCommand::Delete { id } => {
            post_service(ctx)?.delete(&session, id).await?;
            println!("Deleted {id}");
            Ok(())
        }
        AdminCommand::Settings {
            title,
            author,
            json,
        } => {
            let service = AdminSettingsService::new(ctx.store.clone(), ctx.uploads()?);
            let mut current = service.load().await;
            if title.is_some() || author.is_some() {
                let title = title.unwrap_or_else(|| current.site_title.clone());
                let author = author.unwrap_or_else(|| current.site_author.clone());
                current = service.save(&session, &title, &author).await?;
            }
            if json {
                print::print_json(&current)
            } else {
                print::site_settings(&current);
                Ok(())
            }
        }
        AdminCommand::Hero { file } => {
            let bytes = fs::read(&file).await.map_err(InfraError::read(&file))?;
            let service = AdminSettingsService::new(ctx.store.clone(), ctx.uploads()?);
            let url = service
                .replace_hero(&session, &file_name_of(&file), Bytes::from(bytes))
                .await?;
            println!("Hero image: {url}");
            Ok(())
        }
    }
}

async fn login(ctx: &Ctx, email: &str, password: &str) -> Result<AdminSession, AppError> {
    let admin = &ctx.settings.admin;
    let (Some(account), Some(hash)) = (admin.email.as_deref(), admin.password_sha256.as_deref())
    else {
        return Err(InfraError::configuration(
            "admin.email and admin.password_sha256 must be configured",
        )
        .into());
    };

    let authenticator = StaticAuthenticator::new(account, hash)?;
    let auth = AuthService::new(Arc::new(authenticator));
    Ok(auth.login(email, password).await?)
}

fn post_service(ctx: &Ctx) -> Result<AdminPostService, AppError> {
    Ok(AdminPostService::new(
        ctx.store.clone(),
        ctx.store.clone(),
        ctx.uploads()?,
        ctx.settings.site.utc_offset,
    ))
}

/// Without field flags, print the form; otherwise merge the flags over it and save.
async fn edit(ctx: &Ctx, session: &AdminSession, id: Uuid, form: PostFormArgs) -> Result<(), AppError> {
    let service = post_service(ctx)?;
    let existing: PostForm = service.edit_form(session, id).await?;
    if form.is_empty() {
        print::post_form(&existing);
        return Ok(());
    }

    let date = match form.date.as_deref() {
        Some(raw) => parse_date(Some(raw))?,
        None => parse_date(Some(existing.date.as_str()).filter(|value| !value.is_empty()))?,
    };
    let command = SavePostCommand {
        id: Some(id),
        title: form.title.clone().unwrap_or(existing.title),
        date,
        content: read_content(&form).await?.unwrap_or(existing.content),
        published: form.published.unwrap_or(existing.published),
        cover: read_cover(form.cover.as_deref()).await?,
    };
    let record = service.save(session, command).await?;
    println!("Updated {} ({})", record.slug, record.id);
    Ok(())
}

fn parse_date(raw: Option<&str>) -> Result<Option<Date>, AppError> {
    raw.map(parse_form_date).transpose().map_err(AppError::from)
}

async fn read_content(form: &PostFormArgs) -> Result<Option<String>, AppError> {
    if let Some(content) = form.content.as_ref() {
        return Ok(Some(content.clone()));
    }
    match form.content_file.as_ref() {
        Some(path) => {
            let text = fs::read_to_string(path)
                .await
                .map_err(InfraError::read(path))?;
            Ok(Some(text))
        }
        None => Ok(None),
    }
}

async fn read_cover(path: Option<&Path>) -> Result<Option<CoverUpload>, AppError> {
    let Some(path) = path else {
        return Ok(None);
    };
    let bytes = fs::read(path).await.map_err(InfraError::read(path))?;
    Ok(Some(CoverUpload {
        file_name: file_name_of(path),
        bytes: Bytes::from(bytes),
    }))
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("upload")
        .to_string()
}
