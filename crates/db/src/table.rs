use sea_query::Iden;

/// Current stock projection per (household, product).
#[derive(Iden, Clone)]
pub enum Stock {
    Table,
    Id,
    HouseholdId,
    ProductId,
    DaysLeft,
    Level,
    LastSource,
    UpdatedAt,
}

/// Append-only audit trail of applied events.
#[derive(Iden, Clone)]
pub enum AuditLog {
    Table,
    Id,
    HouseholdId,
    ProductId,
    Kind,
    Reason,
    Note,
    At,
    DaysBefore,
    DaysAfter,
    MeanBefore,
    MeanAfter,
    IdempotencyKey,
    OutOfOrder,
}

/// Append-only forecast snapshots, one per change of days-left or level.
#[derive(Iden, Clone)]
pub enum ForecastLog {
    Table,
    Id,
    HouseholdId,
    ProductId,
    GeneratedAt,
    ExpectedDaysLeft,
    Level,
    Confidence,
    EventId,
}

/// Reconciler worklist: one row per tracked pair with its anniversary
/// weekday and the last weekly tick.
#[derive(Iden, Clone)]
pub enum Sweep {
    Table,
    Id,
    HouseholdId,
    ProductId,
    AnniversaryWeekday,
    LastTickAt,
}
