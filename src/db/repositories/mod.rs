mod activities;
mod routines;
