use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // ── classrooms ──
        manager
            .create_table(
                Table::create()
                    .table(Classrooms::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Classrooms::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Classrooms::Name).string().not_null())
                    .col(
                        ColumnDef::new(Classrooms::Code)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Classrooms::Subject).string().not_null())
                    .col(ColumnDef::new(Classrooms::Description).string().null())
                    .col(ColumnDef::new(Classrooms::TeacherId).integer().not_null())
                    .col(ColumnDef::new(Classrooms::Status).string().not_null())
                    .col(ColumnDef::new(Classrooms::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(Classrooms::UpdatedAt).timestamp().not_null())
                    .to_owned(),
            )
            .await?;

        // ── enrollments ──
        manager
            .create_table(
                Table::create()
                    .table(Enrollments::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Enrollments::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Enrollments::ClassroomId)
                            .integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Enrollments::UserId).integer().not_null())
                    .col(ColumnDef::new(Enrollments::CreatedAt).timestamp().not_null())
                    .to_owned(),
            )
            .await?;

        // A user enrolls in a classroom at most once.
        manager
            .create_index(
                Index::create()
                    .name("idx-enrollments-classroom-user")
                    .table(Enrollments::Table)
                    .col(Enrollments::ClassroomId)
                    .col(Enrollments::UserId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // ── assignments ──
        manager
            .create_table(
                Table::create()
                    .table(Assignments::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Assignments::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Assignments::Title).string().not_null())
                    .col(ColumnDef::new(Assignments::Description).string().null())
                    .col(ColumnDef::new(Assignments::DueDate).timestamp().not_null())
                    .col(
                        ColumnDef::new(Assignments::ClassroomId)
                            .integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Assignments::UserId).integer().not_null())
                    .col(ColumnDef::new(Assignments::Status).string().not_null())
                    .col(ColumnDef::new(Assignments::FileData).blob().null())
                    .col(ColumnDef::new(Assignments::FileName).string().null())
                    .col(ColumnDef::new(Assignments::FileType).string().null())
                    .col(ColumnDef::new(Assignments::FileSize).big_integer().null())
                    .col(ColumnDef::new(Assignments::CreatedAt).timestamp().not_null())
                    .to_owned(),
            )
            .await?;

        // ── submissions ──
        manager
            .create_table(
                Table::create()
                    .table(Submissions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Submissions::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Submissions::AssignmentId)
                            .integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Submissions::UserId).integer().not_null())
                    .col(ColumnDef::new(Submissions::FileData).blob().not_null())
                    .col(ColumnDef::new(Submissions::FileName).string().not_null())
                    .col(ColumnDef::new(Submissions::FileType).string().not_null())
                    .col(
                        ColumnDef::new(Submissions::FileSize)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Submissions::Status).string().not_null())
                    .col(
                        ColumnDef::new(Submissions::WasLate)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Submissions::SubmittedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Submissions::Grade).integer().null())
                    .col(ColumnDef::new(Submissions::Feedback).string().null())
                    .col(ColumnDef::new(Submissions::GradedAt).timestamp().null())
                    .to_owned(),
            )
            .await?;

        // One submission per (assignment, user); the constraint violation
        // is the duplicate-submission 409 path.
        manager
            .create_index(
                Index::create()
                    .name("idx-submissions-assignment-user")
                    .table(Submissions::Table)
                    .col(Submissions::AssignmentId)
                    .col(Submissions::UserId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // ── announcements ──
        manager
            .create_table(
                Table::create()
                    .table(Announcements::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Announcements::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Announcements::Title).string().not_null())
                    .col(ColumnDef::new(Announcements::Content).text().not_null())
                    .col(
                        ColumnDef::new(Announcements::DatePosted)
                            .timestamp()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Announcements::ClassroomId)
                            .integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Announcements::UserId).integer().not_null())
                    .to_owned(),
            )
            .await?;

        // ── materials ──
        manager
            .create_table(
                Table::create()
                    .table(Materials::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Materials::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Materials::Title).string().not_null())
                    .col(ColumnDef::new(Materials::Description).string().null())
                    .col(ColumnDef::new(Materials::Kind).string().not_null())
                    .col(ColumnDef::new(Materials::Url).string().null())
                    .col(ColumnDef::new(Materials::FileData).blob().null())
                    .col(ColumnDef::new(Materials::FileName).string().null())
                    .col(ColumnDef::new(Materials::FileType).string().null())
                    .col(ColumnDef::new(Materials::FileSize).big_integer().null())
                    .col(ColumnDef::new(Materials::ClassroomId).integer().not_null())
                    .col(ColumnDef::new(Materials::UserId).integer().not_null())
                    .col(ColumnDef::new(Materials::CreatedAt).timestamp().not_null())
                    .to_owned(),
            )
            .await?;

        // ── dismissed_notifications ──
        manager
            .create_table(
                Table::create()
                    .table(DismissedNotifications::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(DismissedNotifications::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(DismissedNotifications::UserId)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(DismissedNotifications::NotificationId)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(DismissedNotifications::NotificationType)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(DismissedNotifications::DismissedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // Upsert target: dismissing the same notification twice is a no-op.
        manager
            .create_index(
                Index::create()
                    .name("idx-dismissed-user-notification-type")
                    .table(DismissedNotifications::Table)
                    .col(DismissedNotifications::UserId)
                    .col(DismissedNotifications::NotificationId)
                    .col(DismissedNotifications::NotificationType)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(
                Table::drop()
                    .table(DismissedNotifications::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_table(Table::drop().table(Materials::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Announcements::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Submissions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Assignments::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Enrollments::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Classrooms::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Classrooms {
    Table,
    Id,
    Name,
    Code,
    Subject,
    Description,
    TeacherId,
    Status,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Enrollments {
    Table,
    Id,
    ClassroomId,
    UserId,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Assignments {
    Table,
    Id,
    Title,
    Description,
    DueDate,
    ClassroomId,
    UserId,
    Status,
    FileData,
    FileName,
    FileType,
    FileSize,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Submissions {
    Table,
    Id,
    AssignmentId,
    UserId,
    FileData,
    FileName,
    FileType,
    FileSize,
    Status,
    WasLate,
    SubmittedAt,
    Grade,
    Feedback,
    GradedAt,
}

#[derive(DeriveIden)]
enum Announcements {
    Table,
    Id,
    Title,
    Content,
    DatePosted,
    ClassroomId,
    UserId,
}

#[derive(DeriveIden)]
enum Materials {
    Table,
    Id,
    Title,
    Description,
    Kind,
    Url,
    FileData,
    FileName,
    FileType,
    FileSize,
    ClassroomId,
    UserId,
    CreatedAt,
}

#[derive(DeriveIden)]
enum DismissedNotifications {
    Table,
    Id,
    UserId,
    NotificationId,
    NotificationType,
    DismissedAt,
}
