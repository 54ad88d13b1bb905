mod test_direct_notify;
mod test_full_roster_broadcast;
